use axum::response::Html;

// GET /about/author/
pub async fn author() -> Html<&'static str> {
    Html(include_str!("../../templates/about/author.html"))
}

// GET /about/tech/
pub async fn tech() -> Html<&'static str> {
    Html(include_str!("../../templates/about/tech.html"))
}
