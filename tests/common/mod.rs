#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use rental_ops::config::environment::{EnvironmentConfig, StorageBackend};
use rental_ops::models::{
    agreement::{AgreementStatus, RentalAgreement},
    booking::{Booking, BookingStatus},
    inspection::{ConditionPhoto, PhotoAngle, VehiclePrepChecklist, WalkaroundInspection},
    payment::{Payment, PaymentStatus},
    verification::{DocumentType, VerificationDocument, VerificationStatus},
};
use rental_ops::repositories::InMemoryOperationsStore;
use rental_ops::routes::create_router;
use rental_ops::state::AppState;
use rental_ops::utils::jwt::{generate_token, JwtConfig, StaffRole};

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 3600,
        cors_origins: Vec::new(),
        storage_backend: StorageBackend::Memory,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryOperationsStore>,
    pub token: String,
}

pub fn staff_token(role: StaffRole) -> String {
    generate_token(
        Uuid::new_v4(),
        role,
        &JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration: 3600,
        },
    )
    .unwrap()
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_role(StaffRole::Agent)
    }

    pub fn with_role(role: StaffRole) -> Self {
        let store = Arc::new(InMemoryOperationsStore::new());
        let router = create_router(AppState::new(test_config(), store.clone()));
        Self {
            router,
            store,
            token: staff_token(role),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<serde_json::Value>, authorized: bool) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if authorized {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// POST autenticado con cuerpo y content type arbitrarios
    pub async fn post_raw(&self, uri: &str, content_type: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.request("GET", uri, None, true).await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.request("POST", uri, Some(body), true).await
    }
}

pub fn booking(status: BookingStatus) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        vehicle_id: Some(Uuid::new_v4()),
        pickup_location_id: Uuid::new_v4(),
        start_at: now + Duration::days(2),
        end_at: now + Duration::days(5),
        daily_rate: Decimal::new(4900, 2),
        subtotal: Decimal::new(14700, 2),
        tax: Decimal::new(2940, 2),
        total: Decimal::new(17640, 2),
        deposit_amount: Decimal::new(25000, 2),
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Reserva con vehículo, permiso verificado, preparación y fotos completas
pub async fn seed_ready_for_payment(store: &InMemoryOperationsStore, status: BookingStatus) -> Uuid {
    let booking = booking(status);
    let id = booking.id;
    store.insert_booking(booking).await.unwrap();

    for document_type in [DocumentType::LicenseFront, DocumentType::LicenseBack] {
        store
            .add_verification_document(VerificationDocument {
                id: Uuid::new_v4(),
                booking_id: id,
                document_type,
                status: VerificationStatus::Verified,
                storage_path: format!("licenses/{}", Uuid::new_v4()),
                uploaded_at: Utc::now(),
                reviewed_at: Some(Utc::now()),
            })
            .await
            .unwrap();
    }

    store
        .set_vehicle_prep(VehiclePrepChecklist {
            id: Uuid::new_v4(),
            booking_id: id,
            completed: true,
            completed_at: Some(Utc::now()),
        })
        .await
        .unwrap();

    for angle in PhotoAngle::REQUIRED {
        store
            .add_condition_photo(ConditionPhoto {
                id: Uuid::new_v4(),
                booking_id: id,
                angle,
                storage_path: format!("photos/{}", Uuid::new_v4()),
                taken_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    id
}

pub async fn seed_payment_and_agreement(store: &InMemoryOperationsStore, id: Uuid) {
    store
        .add_payment(Payment {
            id: Uuid::new_v4(),
            booking_id: id,
            amount: Decimal::new(17640, 2),
            status: PaymentStatus::Completed,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    store
        .set_agreement(RentalAgreement {
            id: Uuid::new_v4(),
            booking_id: id,
            status: AgreementStatus::Signed,
            signed_at: Some(Utc::now()),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

pub async fn seed_walkaround(store: &InMemoryOperationsStore, id: Uuid) {
    store
        .set_walkaround(WalkaroundInspection {
            id: Uuid::new_v4(),
            booking_id: id,
            inspection_complete: true,
            customer_acknowledged: true,
            inspected_by: Some(Uuid::new_v4()),
            notes: Some("Small scratch on rear bumper noted".to_string()),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}
