mod common;

use std::time::Duration;

use breedflow_core::sources::{BreedsResource, Resource};
use breedflow_utils::error::Error;
use serde_json::json;

use common::{FakeApi, TWO_BREEDS};

#[tokio::test]
async fn yields_breeds_in_order_with_one_timestamp() {
    let api = FakeApi::start(200, TWO_BREEDS).await;
    let resource = BreedsResource::new(api.breeds_url());

    let rows: Vec<_> = resource.extract().await.unwrap().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].row_id, 1);
    assert_eq!(rows[1].row_id, 2);
    assert_eq!(rows[0].breed_json["name"], "Affenpinscher");
    assert_eq!(rows[1].breed_json["name"], "Beagle");
    assert_eq!(rows[0].updated_at, rows[1].updated_at);
    assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn breed_objects_pass_through_untouched() {
    let api = FakeApi::start(200, TWO_BREEDS).await;
    let rows: Vec<_> = BreedsResource::new(api.breeds_url())
        .extract()
        .await
        .unwrap()
        .collect();

    assert_eq!(
        rows[1].breed_json,
        json!({"id": 2, "name": "Beagle", "bred_for": null, "weight": {"metric": "9 - 11"}})
    );
}

#[tokio::test]
async fn each_extract_fetches_again() {
    let api = FakeApi::start(200, TWO_BREEDS).await;
    let resource = BreedsResource::new(api.breeds_url());

    let first = resource.extract().await.unwrap();
    let second = resource.extract().await.unwrap();
    assert_eq!(api.hits(), 2);
    assert!(second.updated_at() >= first.updated_at());
}

#[tokio::test]
async fn empty_catalogue_yields_nothing() {
    let api = FakeApi::start(200, "[]").await;
    let rows = BreedsResource::new(api.breeds_url()).extract().await.unwrap();
    assert_eq!(rows.total(), 0);
    assert_eq!(rows.count(), 0);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let api = FakeApi::start(500, r#"{"message": "boom"}"#).await;
    let err = BreedsResource::new(api.breeds_url()).extract().await.unwrap_err();

    match err {
        Error::Status { status, url } => {
            assert_eq!(status.as_u16(), 500);
            assert!(url.ends_with("/v1/breeds"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn not_found_is_a_status_error() {
    let api = FakeApi::start(404, "").await;
    let err = BreedsResource::new(api.breeds_url()).extract().await.unwrap_err();
    assert!(matches!(err, Error::Status { .. }));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let api = FakeApi::start_with_delay(200, TWO_BREEDS, Duration::from_secs(2)).await;
    let err = BreedsResource::new(api.breeds_url())
        .with_timeout(Duration::from_millis(200))
        .extract()
        .await
        .unwrap_err();

    match err {
        Error::Http(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn object_body_is_rejected() {
    let api = FakeApi::start(200, r#"{"id": 1, "name": "Affenpinscher"}"#).await;
    let err = BreedsResource::new(api.breeds_url()).extract().await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let api = FakeApi::start(200, "[{\"id\": 1,").await;
    let err = BreedsResource::new(api.breeds_url()).extract().await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let err = BreedsResource::new("http://127.0.0.1:9/v1/breeds")
        .extract()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}
