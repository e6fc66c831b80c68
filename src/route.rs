use crate::enums::Layout;
use crate::grid::{GridAssignment, compute_assignment};
use crate::state::ViewerSnapshot;

/// Pages of the viewer: `/` and `/grid/:layout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Grid(Layout),
    /// `/grid/<token>` with a token that names no layout
    InvalidLayout(String),
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = strip_query_and_fragment(path).trim();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["grid", token] => match token.parse::<Layout>() {
                Ok(layout) => Route::Grid(layout),
                Err(_) => Route::InvalidLayout((*token).to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn grid(layout: Layout) -> Self {
        Route::Grid(layout)
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Grid(layout) => format!("/grid/{layout}"),
            Route::InvalidLayout(token) => format!("/grid/{token}"),
            Route::NotFound(path) => path.clone(),
        }
    }
}

/// What the page for a route shows, given the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Home,
    InvalidLayout(String),
    /// Grid page reached before any load succeeded
    NoSeriesLoaded,
    NotFound(String),
    Grid(GridAssignment),
}

pub fn resolve_view(route: &Route, snapshot: &ViewerSnapshot) -> View {
    match route {
        Route::Home => View::Home,
        Route::InvalidLayout(token) => View::InvalidLayout(token.clone()),
        Route::NotFound(path) => View::NotFound(path.clone()),
        Route::Grid(_) if snapshot.series.is_empty() => View::NoSeriesLoaded,
        Route::Grid(layout) if *layout == snapshot.layout => View::Grid(snapshot.assignment.clone()),
        Route::Grid(layout) => View::Grid(compute_assignment(&snapshot.series, *layout)),
    }
}

fn strip_query_and_fragment(value: &str) -> &str {
    let end = value.find(['?', '#']).unwrap_or(value.len());
    &value[..end]
}
