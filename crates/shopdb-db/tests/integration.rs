//! Offline unit tests for shopdb-db pool configuration, error helpers and row types.
//! These tests do not require a live database connection.

use shopdb_core::{AppConfig, Environment, OrderState};
use shopdb_db::{DbError, OrderDetail, OrderItemRow, OrderRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        token_salt: "salt".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        fetch_timeout_secs: 30,
        fetch_user_agent: "ua".to_string(),
        max_upload_bytes: 1024,
        rate_limit_per_minute: 60,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn invalid_transition_message_names_both_states() {
    let err = DbError::InvalidTransition {
        from: OrderState::Sent,
        to: OrderState::Canceled,
    };
    assert_eq!(err.to_string(), "order cannot move from 'sent' to 'canceled'");
}

#[test]
fn unknown_category_message_uses_product_position() {
    let err = DbError::UnknownCategory {
        category: 7,
        position: 2,
    };
    assert_eq!(err.to_string(), "category 7 of product #2 does not exist");
}

#[test]
fn non_database_errors_are_not_unique_violations() {
    assert!(!DbError::NotFound.is_unique_violation());
    assert!(!DbError::Sqlx(sqlx::Error::RowNotFound).is_unique_violation());
}

#[test]
fn order_detail_serializes_flat_with_items() {
    use chrono::Utc;

    let detail = OrderDetail {
        order: OrderRow {
            id: 5,
            user_id: 1,
            state: "basket".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        items: vec![OrderItemRow {
            id: 9,
            product_info_id: 3,
            product_name: "PhoneX".to_string(),
            model: "X1".to_string(),
            shop_id: 2,
            shop_name: "Connected".to_string(),
            price: 100,
            quantity: 2,
        }],
        total_sum: 200,
    };

    let json = serde_json::to_value(&detail).expect("serialize");
    assert_eq!(json["id"], 5);
    assert_eq!(json["state"], "basket");
    assert_eq!(json["total_sum"], 200);
    assert_eq!(json["items"][0]["product_name"], "PhoneX");
}
