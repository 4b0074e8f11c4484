use console_app::{
    api::Api,
    config::Config,
    coordinator::{Coordinator, DeletionStage, DeletionState},
    Error,
};
use httpmock::prelude::*;
use serde_json::{json, Value};
use shared::{
    forms::{CarChanges, CarDraft, RegistrationChanges, RegistrationDraft},
    validation::Field,
};

const PLATE: &str = "A123BC45";

fn coordinator(server: &MockServer) -> Coordinator {
    let config = Config::new(&server.base_url(), Some("test-token".into())).unwrap();
    Coordinator::new(&Api::new(&config).unwrap())
}

fn lada() -> Value {
    json!({ "make": "Lada", "model": "Vesta", "license_plate": PLATE })
}

fn registration() -> Value {
    json!({
        "license_plate": PLATE,
        "owner_name": "Ivan Petrov",
        "owner_address": "Lenina 1",
        "year_of_manufacture": 2018
    })
}

async fn registration_search<'a>(server: &'a MockServer, found: Vec<Value>) -> httpmock::Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/regdb/search_registrations/")
                .query_param("query", PLATE);
            then.status(200)
                .json_body(json!({ "registrations": found }));
        })
        .await
}

async fn registration_delete(server: &MockServer, status: u16, body: Value) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path(format!("/regdb/delete_registration/{PLATE}"));
            then.status(status).json_body(body.clone());
        })
        .await
}

async fn car_delete(server: &MockServer, status: u16, body: Value) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/carsdb/delete_car/{PLATE}"));
            then.status(status).json_body(body.clone());
        })
        .await
}

#[tokio::test]
async fn deleting_a_car_deletes_its_registration_first() {
    let server = MockServer::start_async().await;
    let search = registration_search(&server, vec![registration()]).await;
    let delete_registration = registration_delete(&server, 200, json!({})).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let deleted = coordinator(&server).delete_car(PLATE).await.unwrap();

    search.assert_hits_async(1).await;
    delete_registration.assert_hits_async(1).await;
    delete_car.assert_hits_async(1).await;
    assert_eq!(deleted.license_plate, PLATE);
    assert_eq!(
        deleted.registration.map(|registration| registration.owner_name),
        Some("Ivan Petrov".to_string())
    );
    assert_eq!(
        deleted.history,
        vec![
            DeletionState::Idle,
            DeletionState::CheckingRegistration,
            DeletionState::DeletingRegistration,
            DeletionState::DeletingCar,
            DeletionState::Done,
        ]
    );
}

#[tokio::test]
async fn unregistered_car_is_deleted_directly() {
    let server = MockServer::start_async().await;
    registration_search(&server, Vec::new()).await;
    let delete_registration = registration_delete(&server, 200, json!({})).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let deleted = coordinator(&server).delete_car(PLATE).await.unwrap();

    delete_registration.assert_hits_async(0).await;
    delete_car.assert_hits_async(1).await;
    assert_eq!(deleted.registration, None);
    assert!(!deleted
        .history
        .contains(&DeletionState::DeletingRegistration));
}

#[tokio::test]
async fn failed_registration_delete_leaves_the_car_alone() {
    let server = MockServer::start_async().await;
    registration_search(&server, vec![registration()]).await;
    registration_delete(&server, 500, json!({ "detail": "Database unavailable" })).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let error = coordinator(&server).delete_car(PLATE).await.unwrap_err();

    delete_car.assert_hits_async(0).await;
    match error {
        Error::CarDeletionFailed {
            stage,
            registration_deleted,
            history,
            source,
            ..
        } => {
            assert_eq!(stage, DeletionStage::DeletingRegistration);
            assert!(!registration_deleted);
            assert_eq!(
                history,
                vec![
                    DeletionState::Idle,
                    DeletionState::CheckingRegistration,
                    DeletionState::DeletingRegistration,
                    DeletionState::Failed(DeletionStage::DeletingRegistration),
                ]
            );
            assert!(source.to_string().contains("Database unavailable"));
        }
        other => panic!("expected a failed deletion, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_car_delete_reports_the_registration_as_gone() {
    let server = MockServer::start_async().await;
    registration_search(&server, vec![registration()]).await;
    registration_delete(&server, 200, json!({})).await;
    car_delete(&server, 500, json!({ "detail": "Database unavailable" })).await;

    let error = coordinator(&server).delete_car(PLATE).await.unwrap_err();

    match error {
        Error::CarDeletionFailed {
            stage,
            registration_deleted,
            ..
        } => {
            assert_eq!(stage, DeletionStage::DeletingCar);
            assert!(registration_deleted);
        }
        other => panic!("expected a failed deletion, got {other:?}"),
    }
}

#[tokio::test]
async fn ambiguous_registration_aborts_before_any_delete() {
    let server = MockServer::start_async().await;
    registration_search(&server, vec![registration(), registration()]).await;
    let delete_registration = registration_delete(&server, 200, json!({})).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let error = coordinator(&server).delete_car(PLATE).await.unwrap_err();

    delete_registration.assert_hits_async(0).await;
    delete_car.assert_hits_async(0).await;
    match error {
        Error::CarDeletionFailed { stage, source, .. } => {
            assert_eq!(stage, DeletionStage::CheckingRegistration);
            assert!(matches!(*source, Error::AmbiguousLookup { matches: 2, .. }));
        }
        other => panic!("expected a failed deletion, got {other:?}"),
    }
}

#[tokio::test]
async fn deleting_an_absent_car_twice_is_not_found() {
    let server = MockServer::start_async().await;
    registration_search(&server, Vec::new()).await;
    car_delete(&server, 404, json!({ "detail": "Car not found" })).await;

    let coordinator = coordinator(&server);
    for _ in 0..2 {
        let error = coordinator.delete_car(PLATE).await.unwrap_err();
        assert!(error.is_not_found());
    }
}

#[tokio::test]
async fn deleting_an_absent_registration_is_not_found() {
    let server = MockServer::start_async().await;
    registration_delete(&server, 404, json!({ "detail": "Registration not found" })).await;

    let error = coordinator(&server)
        .delete_registration(PLATE)
        .await
        .unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn expired_session_during_lookup_stops_the_flow() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/regdb/search_registrations/");
            then.status(401);
        })
        .await;
    let delete_registration = registration_delete(&server, 200, json!({})).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let result = coordinator(&server).delete_car(PLATE).await;

    assert!(matches!(result, Err(Error::AuthExpired)));
    delete_registration.assert_hits_async(0).await;
    delete_car.assert_hits_async(0).await;
}

#[tokio::test]
async fn expired_session_during_registration_delete_stops_the_flow() {
    let server = MockServer::start_async().await;
    registration_search(&server, vec![registration()]).await;
    registration_delete(&server, 401, json!({ "detail": "Token expired" })).await;
    let delete_car = car_delete(&server, 200, json!({})).await;

    let result = coordinator(&server).delete_car(PLATE).await;

    assert!(matches!(result, Err(Error::AuthExpired)));
    delete_car.assert_hits_async(0).await;
}

#[tokio::test]
async fn expired_session_during_car_delete_is_reported_once() {
    let server = MockServer::start_async().await;
    registration_search(&server, Vec::new()).await;
    let delete_car = car_delete(&server, 401, json!({ "detail": "Token expired" })).await;

    let result = coordinator(&server).delete_car(PLATE).await;

    assert!(matches!(result, Err(Error::AuthExpired)));
    delete_car.assert_hits_async(1).await;
}

#[tokio::test]
async fn created_car_appears_once_in_the_refreshed_listing() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/carsdb/add_car/").json_body(lada());
            then.status(200)
                .json_body(json!({ "message": "Car added successfully" }));
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/carsdb/get_cars/");
            then.status(200).json_body(json!({ "cars": [
                lada(),
                { "make": "Toyota", "model": "Camry", "license_plate": "B456DE78" }
            ] }));
        })
        .await;

    let draft = CarDraft {
        make: "Lada".into(),
        model: "Vesta".into(),
        license_plate: PLATE.into(),
    };
    let cars = coordinator(&server)
        .add_car(&draft)
        .await
        .unwrap()
        .listing
        .unwrap();

    create.assert_hits_async(1).await;
    list.assert_hits_async(1).await;
    let created: Vec<_> = cars
        .iter()
        .filter(|car| car.license_plate == PLATE)
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].make, "Lada");
    assert_eq!(created[0].model, "Vesta");
}

#[tokio::test]
async fn created_car_stays_created_when_the_refresh_fails() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/carsdb/add_car/");
            then.status(200)
                .json_body(json!({ "message": "Car added successfully" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/carsdb/get_cars/");
            then.status(500)
                .json_body(json!({ "detail": "Database unavailable" }));
        })
        .await;

    let draft = CarDraft {
        make: "Lada".into(),
        model: "Vesta".into(),
        license_plate: PLATE.into(),
    };
    let applied = coordinator(&server).add_car(&draft).await.unwrap();

    create.assert_hits_async(1).await;
    match applied.listing {
        Err(Error::RequestFailed { status, detail }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(detail, "Database unavailable");
        }
        other => panic!("expected a failed refresh, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_input_is_never_sent() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/regdb/add_registration/");
            then.status(200);
        })
        .await;

    let draft = RegistrationDraft {
        license_plate: "A12BC45".into(),
        owner_name: "Ivan Petrov".into(),
        owner_address: "Lenina 1".into(),
        year_of_manufacture: "1850".into(),
    };
    let error = coordinator(&server)
        .add_registration(&draft)
        .await
        .unwrap_err();

    create.assert_hits_async(0).await;
    match error {
        Error::Validation(errors) => {
            assert!(errors.contains(Field::LicensePlate));
            assert!(errors.contains(Field::YearOfManufacture));
            assert!(!errors.contains(Field::OwnerName));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn updates_without_changes_are_refused_locally() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("/carsdb/update_car/{PLATE}"));
            then.status(200);
        })
        .await;

    let result = coordinator(&server)
        .update_car(PLATE, &CarChanges::default())
        .await;

    assert!(matches!(result, Err(Error::NothingToUpdate)));
    update.assert_hits_async(0).await;
}

#[tokio::test]
async fn registration_update_refreshes_the_listing() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/regdb/update_registration/{PLATE}"))
                .json_body(json!({ "owner_address": "Mira 12/3" }));
            then.status(200);
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/regdb/get_registrations/");
            then.status(200)
                .json_body(json!({ "registrations": [registration()] }));
        })
        .await;

    let changes = RegistrationChanges {
        owner_address: Some("Mira 12/3".into()),
        ..Default::default()
    };
    let registrations = coordinator(&server)
        .update_registration(PLATE, &changes)
        .await
        .unwrap()
        .listing
        .unwrap();

    update.assert_hits_async(1).await;
    list.assert_hits_async(1).await;
    assert_eq!(registrations.len(), 1);
}

#[tokio::test]
async fn car_update_sends_only_the_changed_fields() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/carsdb/update_car/{PLATE}"))
                .json_body(json!({ "model": "Granta" }));
            then.status(200)
                .json_body(json!({ "message": "Car updated successfully" }));
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/carsdb/get_cars/");
            then.status(200).json_body(json!({ "cars": [
                { "make": "Lada", "model": "Granta", "license_plate": PLATE }
            ] }));
        })
        .await;

    let changes = CarChanges {
        model: Some("Granta".into()),
        ..Default::default()
    };
    let cars = coordinator(&server)
        .update_car(PLATE, &changes)
        .await
        .unwrap()
        .listing
        .unwrap();

    update.assert_hits_async(1).await;
    list.assert_hits_async(1).await;
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].model, "Granta");
}

#[tokio::test]
async fn expired_session_during_the_refresh_keeps_the_change() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/regdb/add_registration/")
                .json_body(registration());
            then.status(200);
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/regdb/get_registrations/");
            then.status(401);
        })
        .await;

    let draft = RegistrationDraft {
        license_plate: PLATE.into(),
        owner_name: "Ivan Petrov".into(),
        owner_address: "Lenina 1".into(),
        year_of_manufacture: "2018".into(),
    };
    let applied = coordinator(&server)
        .add_registration(&draft)
        .await
        .unwrap();

    create.assert_hits_async(1).await;
    list.assert_hits_async(1).await;
    assert!(matches!(applied.listing, Err(Error::AuthExpired)));
}

#[tokio::test]
async fn status_reports_orphans_on_both_sides() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/carsdb/get_cars/");
            then.status(200).json_body(json!({ "cars": [
                { "make": "Toyota", "model": "Camry", "license_plate": "B456DE78" }
            ] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/regdb/get_registrations/");
            then.status(200)
                .json_body(json!({ "registrations": [registration()] }));
        })
        .await;

    let report = coordinator(&server).status().await.unwrap();

    assert!(report.paired.is_empty());
    assert_eq!(report.unregistered_cars[0].license_plate, "B456DE78");
    assert_eq!(report.orphan_registrations[0].license_plate, PLATE);
}
