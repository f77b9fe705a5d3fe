use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const COURIER_EMAIL: &str = "courier@example.com";
pub const COURIER_PASSWORD: &str = "password";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    pub id: u64,
    pub size: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Delivery {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<u64>,
    pub recipient_id: u64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub number_of_packages: usize,
    pub status: String,
    pub packages: Vec<Package>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

const DELIVERY_STATUSES: [&str; 3] = ["pending", "in_progress", "completed"];
const PACKAGE_STATUSES: [&str; 2] = ["delivered", "incomplete"];

/// In-memory backend state.
#[derive(Debug, Default)]
pub struct Backend {
    pub couriers: HashMap<String, String>,
    pub tokens: HashSet<String>,
    pub deliveries: BTreeMap<u64, Delivery>,
    pub businesses: HashMap<u64, Business>,
    pub customers: HashMap<u64, Customer>,
}

impl Backend {
    /// One courier, one business, three customers, and three deliveries
    /// around downtown Austin.
    pub fn seeded() -> Self {
        let mut backend = Backend::default();
        backend
            .couriers
            .insert(COURIER_EMAIL.to_string(), COURIER_PASSWORD.to_string());
        backend.businesses.insert(
            1,
            Business {
                name: "Acme Supply".to_string(),
            },
        );
        for (id, first, last, phone, address) in [
            (1, "Grace", "Hopper", "555-0101", "12 Navy Yard Rd"),
            (2, "Ada", "Lovelace", "555-0102", "500 Congress Ave"),
            (3, "Alan", "Turing", "555-0103", "1100 Guadalupe St"),
        ] {
            backend.customers.insert(
                id,
                Customer {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone_number: phone.to_string(),
                    address: address.to_string(),
                },
            );
        }

        let package = |id, size: &str, status: &str| Package {
            id,
            size: size.to_string(),
            status: status.to_string(),
        };
        backend.insert_delivery(Delivery {
            id: 1,
            sender_id: None,
            business_id: Some(1),
            recipient_id: 2,
            address: "500 Congress Ave".to_string(),
            latitude: 30.2682,
            longitude: -97.7429,
            number_of_packages: 0,
            status: "pending".to_string(),
            packages: vec![
                package(10, "large", "incomplete"),
                package(11, "small", "incomplete"),
            ],
        });
        backend.insert_delivery(Delivery {
            id: 2,
            sender_id: Some(1),
            business_id: None,
            recipient_id: 3,
            address: "1100 Guadalupe St".to_string(),
            latitude: 30.2747,
            longitude: -97.7446,
            number_of_packages: 0,
            status: "in_progress".to_string(),
            packages: vec![package(20, "medium", "delivered")],
        });
        backend.insert_delivery(Delivery {
            id: 3,
            sender_id: Some(3),
            business_id: None,
            recipient_id: 2,
            address: "500 Congress Ave".to_string(),
            latitude: 30.2682,
            longitude: -97.7429,
            number_of_packages: 0,
            status: "completed".to_string(),
            packages: vec![package(30, "small", "delivered")],
        });
        backend
    }

    pub fn insert_delivery(&mut self, mut delivery: Delivery) {
        delivery.number_of_packages = delivery.packages.len();
        self.deliveries.insert(delivery.id, delivery);
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app() -> Router {
    app_with(Backend::seeded())
}

pub fn app_with(backend: Backend) -> Router {
    let db: Db = Arc::new(RwLock::new(backend));
    Router::new()
        .route("/login", post(login))
        .route("/deliveries", get(list_deliveries))
        .route("/deliveries/{id}", get(get_delivery).put(update_delivery))
        .route("/deliveries/{id}/packages", get(list_packages))
        .route("/deliveries/{id}/packages/{package_id}", put(update_package))
        .route("/business/{id}", get(get_business))
        .route("/customer/{id}", get(get_customer))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Reject the request unless it carries a bearer token issued by `/login`.
fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if backend.tokens.contains(token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    let mut backend = db.write().await;
    match backend.couriers.get(&input.email) {
        Some(password) if *password == input.password => {
            let token = Uuid::new_v4().to_string();
            backend.tokens.insert(token.clone());
            tracing::info!("courier logged in");
            Ok(Json(LoginResponse { token }))
        }
        _ => {
            tracing::warn!("rejected login");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn list_deliveries(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Delivery>>, StatusCode> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    Ok(Json(backend.deliveries.values().cloned().collect()))
}

async fn get_delivery(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Delivery>, StatusCode> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .deliveries
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_delivery(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Delivery>, StatusCode> {
    let mut backend = db.write().await;
    authorize(&backend, &headers)?;
    if !DELIVERY_STATUSES.contains(&input.status.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let delivery = backend.deliveries.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    tracing::info!(delivery_id = id, status = %input.status, "delivery status updated");
    delivery.status = input.status;
    Ok(Json(delivery.clone()))
}

async fn list_packages(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Package>>, StatusCode> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .deliveries
        .get(&id)
        .map(|d| Json(d.packages.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_package(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, package_id)): Path<(u64, u64)>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Package>, StatusCode> {
    let mut backend = db.write().await;
    authorize(&backend, &headers)?;
    if !PACKAGE_STATUSES.contains(&input.status.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let package = backend
        .deliveries
        .get_mut(&id)
        .and_then(|d| d.packages.iter_mut().find(|p| p.id == package_id))
        .ok_or(StatusCode::NOT_FOUND)?;
    tracing::info!(delivery_id = id, package_id, status = %input.status, "package status updated");
    package.status = input.status;
    Ok(Json(package.clone()))
}

async fn get_business(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Business>, StatusCode> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .businesses
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_customer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Customer>, StatusCode> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .customers
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
