//! Application router configuration.

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    not_found::get_404_not_found,
    sale::{
        get_bar_chart_endpoint, get_combined_report_endpoint, get_pie_chart_endpoint,
        get_sales_endpoint, get_statistics_endpoint,
    },
    seed::initialize_db_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::INITIALIZE_DB, get(initialize_db_endpoint))
        .route(endpoints::TRANSACTIONS, get(get_sales_endpoint))
        .route(endpoints::LIST_TRANSACTIONS, get(get_sales_endpoint))
        .route(endpoints::STATISTICS, get(get_statistics_endpoint))
        .route(endpoints::BAR_CHART, get(get_bar_chart_endpoint))
        .route(endpoints::PIE_CHART, get(get_pie_chart_endpoint))
        .route(endpoints::COMBINED_DATA, get(get_combined_report_endpoint))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        AppState,
        db::initialize,
        endpoints,
        sale::{NewSale, insert_sales},
    };

    use super::build_router;

    fn get_test_server(sales: &[NewSale]) -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        insert_sales(sales, &conn).unwrap();

        TestServer::try_new(build_router(AppState::new(conn))).expect("Could not create test server.")
    }

    fn mouse() -> NewSale {
        NewSale {
            title: "Mouse".to_owned(),
            description: None,
            price: 150.0,
            category: "Electronics".to_owned(),
            date_of_sale: datetime!(2022-02-15 00:00:00 UTC),
            sold: true,
            image: "https://default-image-url.com/default.jpg".to_owned(),
        }
    }

    #[tokio::test]
    async fn statistics_for_seeded_mouse() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::STATISTICS)
            .add_query_param("month", "February")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "totalAmount": 150.0,
            "totalItems": 1,
            "totalNotSold": 0
        }));
    }

    #[tokio::test]
    async fn bar_chart_for_seeded_mouse() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::BAR_CHART)
            .add_query_param("month", "February")
            .await;

        response.assert_status_ok();
        let bands = response.json::<Value>();
        let bands = bands.as_array().unwrap();
        assert_eq!(bands.len(), 10);
        for band in bands {
            let want = if band["range"] == "101 - 200" { 1 } else { 0 };
            assert_eq!(band["count"], want, "band {}", band["range"]);
        }
    }

    #[tokio::test]
    async fn pie_chart_for_seeded_mouse() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::PIE_CHART)
            .add_query_param("month", "February")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([{"category": "Electronics", "count": 1}]));
    }

    #[tokio::test]
    async fn statistics_rejects_numeric_month() {
        let server = get_test_server(&[]);

        let response = server
            .get(endpoints::STATISTICS)
            .add_query_param("month", "13")
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "error": "Invalid month parameter. Please provide a valid month name."
        }));
    }

    #[tokio::test]
    async fn list_is_served_with_and_without_trailing_slash() {
        let server = get_test_server(&[mouse()]);

        for path in [endpoints::TRANSACTIONS, endpoints::LIST_TRANSACTIONS] {
            let response = server
                .get(path)
                .add_query_param("month", "February")
                .add_query_param("search", "mou")
                .await;

            response.assert_status_ok();
            let sales = response.json::<Value>();
            assert_eq!(sales[0]["title"], "Mouse", "path {path}");
        }
    }

    #[tokio::test]
    async fn list_rejects_invalid_page() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "February")
            .add_query_param("page", "0")
            .expect_failure()
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn list_returns_404_without_matches() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "February")
            .add_query_param("search", "keyboard")
            .expect_failure()
            .await;

        response.assert_status_not_found();
        response.assert_json(&json!({"error": "No transactions found for the given criteria."}));
    }

    #[tokio::test]
    async fn combined_data_merges_reports() {
        let server = get_test_server(&[mouse()]);

        let response = server
            .get(endpoints::COMBINED_DATA)
            .add_query_param("month", "february")
            .await;

        response.assert_status_ok();
        let report = response.json::<Value>();
        assert_eq!(report["statistics"]["totalItems"], 1);
        assert_eq!(report["barChartData"][1]["count"], 1);
        assert_eq!(report["pieChartData"][0]["category"], "Electronics");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let server = get_test_server(&[]);

        let response = server.get("/api/nothing-here").expect_failure().await;

        response.assert_status_not_found();
        response.assert_json(&json!({"error": "The requested resource could not be found."}));
    }
}
