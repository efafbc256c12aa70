use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Rental API",
        version = "0.1.0",
        description = "Peer-to-peer rental marketplace: items, categories and bookings"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/items", api = domain_items::handlers::ApiDoc),
        (path = "/categories", api = domain_categories::handlers::ApiDoc),
        (path = "/bookings", api = domain_bookings::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_paths_are_nested() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/items",
            "/items/{id}",
            "/categories",
            "/bookings",
            "/bookings/{id}/confirm",
            "/bookings/{id}/cancel",
        ] {
            assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
        }
    }

    #[test]
    fn test_error_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
