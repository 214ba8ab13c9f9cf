use super::*;
use crate::database::test_helpers::{insert_target, new_target, setup_test_db};

#[tokio::test]
async fn test_get_statistics_empty() {
    let db = setup_test_db().await;
    let stats = db.get_statistics().await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.enabled, 0);
    assert_eq!(stats.disabled, 0);
    assert!(stats.by_status.is_empty());
    assert!(stats.by_type.is_empty());
    assert!(stats.by_region.is_empty());
}

#[tokio::test]
async fn test_get_statistics_with_data() {
    let db = setup_test_db().await;

    let http = insert_target(&db, new_target("web01")).await;
    let mut icmp = new_target("router01");
    icmp.probe_type = Some("ICMP".to_string());
    icmp.region = Some("APAC".to_string());
    icmp.enabled = Some(false);
    insert_target(&db, icmp).await;
    insert_target(&db, new_target("web02")).await;

    sqlx::query("UPDATE targets SET last_status = 'UP' WHERE id = ?")
        .bind(http)
        .execute(&db.pool)
        .await
        .unwrap();

    let stats = db.get_statistics().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.enabled, 2);
    assert_eq!(stats.disabled, 1);
    // Targets never checked have no status and are not counted
    assert_eq!(stats.by_status, BTreeMap::from([("UP".to_string(), 1)]));
    assert_eq!(
        stats.by_type,
        BTreeMap::from([("HTTP".to_string(), 2), ("ICMP".to_string(), 1)])
    );
    assert_eq!(
        stats.by_region,
        BTreeMap::from([("APAC".to_string(), 1), ("US-East".to_string(), 2)])
    );
}
