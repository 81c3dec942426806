//! HTMX partial endpoints.
//!
//! These return HTML fragments (not full pages) for HTMX to swap into the
//! list pages every 30 seconds, the cache TTL. The fragments are the same
//! ones the full pages embed.

use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;

use crate::DashboardState;
use crate::pages::{fit_profiles_table_html, load_stats, render, tailorings_table_html};
use crate::query::QueryParams;
use crate::views::*;

// ── Data Table ──────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/data_table.html")]
struct DataTablePartial {
    table: TableHtml,
    notices: Vec<Notice>,
}

/// Render one table fragment, with optional banners above it.
pub fn render_table(table: TableHtml, notices: Vec<Notice>) -> String {
    render(DataTablePartial { table, notices }).0
}

pub async fn tailorings_table(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    match tailorings_table_html(&state, &params, &mut notices).await {
        Some(table) => Html(render_table(table, notices)),
        None => Html(empty_fragment("No Tailorings Found", notices)),
    }
}

pub async fn fit_profiles_table(
    State(state): State<DashboardState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let params = QueryParams::from(pairs);
    let mut notices = Vec::new();
    match fit_profiles_table_html(&state, &params, &mut notices).await {
        Some(table) => Html(render_table(table, notices)),
        None => Html(empty_fragment("No Fit Profiles Found", notices)),
    }
}

#[derive(Template)]
#[template(
    source = "{% for notice in notices %}<div class=\"banner{% if notice.error %} error{% endif %}\">{{ notice.message }}</div>{% endfor %}<p class=\"muted\">{{ message }}</p>",
    ext = "html"
)]
struct EmptyPartial<'a> {
    message: &'a str,
    notices: Vec<Notice>,
}

fn empty_fragment(message: &str, notices: Vec<Notice>) -> String {
    render(EmptyPartial { message, notices }).0
}

// ── Overview Stats ──────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/stats.html")]
struct StatsPartial {
    cards: Vec<StatCard>,
}

pub fn render_stats(cards: Vec<StatCard>) -> String {
    render(StatsPartial { cards }).0
}

pub async fn overview_stats(State(state): State<DashboardState>) -> Html<String> {
    let mut notices = Vec::new();
    let stats = load_stats(&state, &mut notices).await;
    Html(render_stats(stat_cards(&stats)))
}
