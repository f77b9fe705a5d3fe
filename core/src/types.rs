//! Domain records exchanged with the delivery backend.
//!
//! # Design
//! These types mirror the backend schema but are defined independently of
//! the mock-server crate; integration tests catch schema drift.
//!
//! Deliveries decode through `WireDelivery`, which is where the schema is
//! validated: the misspelled `longtitude` and `receipient_id` fields seen in
//! older payloads are rejected rather than guessed at, and a delivery that
//! names both a business and a customer sender is rejected. Lists are
//! decoded per record so one rejected delivery only drops itself.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Lifecycle of a delivery: `pending -> in_progress -> completed`.
///
/// Unknown strings are kept verbatim and count as not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryStatus {
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InProgress => "in_progress",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DeliveryStatus::Completed)
    }
}

impl From<String> for DeliveryStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => DeliveryStatus::Pending,
            "in_progress" => DeliveryStatus::InProgress,
            "completed" => DeliveryStatus::Completed,
            _ => DeliveryStatus::Other(s),
        }
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package state, freely toggled between `incomplete` and `delivered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageStatus {
    Delivered,
    Incomplete,
    Other(String),
}

impl PackageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PackageStatus::Delivered => "delivered",
            PackageStatus::Incomplete => "incomplete",
            PackageStatus::Other(s) => s,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, PackageStatus::Delivered)
    }

    /// The status a courier's tap moves the package to.
    pub fn toggled(&self) -> PackageStatus {
        if self.is_delivered() {
            PackageStatus::Incomplete
        } else {
            PackageStatus::Delivered
        }
    }
}

impl From<String> for PackageStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "delivered" => PackageStatus::Delivered,
            "incomplete" => PackageStatus::Incomplete,
            _ => PackageStatus::Other(s),
        }
    }
}

impl From<PackageStatus> for String {
    fn from(status: PackageStatus) -> Self {
        match status {
            PackageStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single package. Always belongs to exactly one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: u64,
    pub size: String,
    pub status: PackageStatus,
}

/// Where a delivery's sender record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRef {
    /// `business_id` on the wire; resolved via `/business/{id}`.
    Business(u64),
    /// `sender_id` on the wire; resolved via `/customer/{id}`.
    Customer(u64),
}

/// A delivery as returned by `/deliveries` and `/deliveries/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireDelivery", into = "WireDelivery")]
pub struct Delivery {
    pub id: u64,
    pub sender: Option<SenderRef>,
    pub recipient_id: Option<u64>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub number_of_packages: Option<u32>,
    pub status: Option<DeliveryStatus>,
    pub packages: Vec<Package>,
}

impl Delivery {
    pub fn is_completed(&self) -> bool {
        self.status.as_ref().is_some_and(DeliveryStatus::is_completed)
    }

    pub fn coordinates(&self) -> Option<LatLng> {
        Some(LatLng {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct WireDelivery {
    id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    business_id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "id_or_numeric_string",
        skip_serializing_if = "Option::is_none"
    )]
    recipient_id: Option<u64>,
    #[serde(default, rename = "receipient_id", skip_serializing)]
    misspelled_recipient_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(default, rename = "longtitude", skip_serializing)]
    misspelled_longitude: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_of_packages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<DeliveryStatus>,
    #[serde(default)]
    packages: Vec<Package>,
}

/// Ids sometimes arrive quoted (`"7"`); accept both forms.
fn id_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid id `{text}`"))),
    }
}

impl TryFrom<WireDelivery> for Delivery {
    type Error = String;

    fn try_from(wire: WireDelivery) -> Result<Self, Self::Error> {
        if wire.misspelled_longitude.is_some() {
            return Err(format!(
                "delivery {}: unexpected field `longtitude`, expected `longitude`",
                wire.id
            ));
        }
        if wire.misspelled_recipient_id.is_some() {
            return Err(format!(
                "delivery {}: unexpected field `receipient_id`, expected `recipient_id`",
                wire.id
            ));
        }
        let sender = match (wire.business_id, wire.sender_id) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "delivery {}: both `business_id` and `sender_id` are set",
                    wire.id
                ))
            }
            (Some(id), None) => Some(SenderRef::Business(id)),
            (None, Some(id)) => Some(SenderRef::Customer(id)),
            (None, None) => None,
        };

        Ok(Delivery {
            id: wire.id,
            sender,
            recipient_id: wire.recipient_id,
            address: wire.address,
            latitude: wire.latitude,
            longitude: wire.longitude,
            number_of_packages: wire.number_of_packages,
            status: wire.status,
            packages: wire.packages,
        })
    }
}

impl From<Delivery> for WireDelivery {
    fn from(d: Delivery) -> Self {
        let (business_id, sender_id) = match d.sender {
            Some(SenderRef::Business(id)) => (Some(id), None),
            Some(SenderRef::Customer(id)) => (None, Some(id)),
            None => (None, None),
        };
        WireDelivery {
            id: d.id,
            sender_id,
            business_id,
            recipient_id: d.recipient_id,
            misspelled_recipient_id: None,
            address: d.address,
            latitude: d.latitude,
            longitude: d.longitude,
            misspelled_longitude: None,
            number_of_packages: d.number_of_packages,
            status: d.status,
            packages: d.packages,
        }
    }
}

/// Decode each record on its own, keeping the ones that validate. A bad
/// record is logged and skipped so it cannot hide the rest of the list.
pub(crate) fn decode_deliveries(records: Vec<serde_json::Value>) -> Vec<Delivery> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Delivery>(record) {
            Ok(delivery) => Some(delivery),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed delivery");
                None
            }
        })
        .collect()
}

/// A business sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
}

/// An individual customer, either sending or receiving a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A resolved sender record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    Business(Business),
    Customer(Customer),
}

impl Sender {
    pub fn display_name(&self) -> String {
        match self {
            Sender::Business(b) => b.name.clone(),
            Sender::Customer(c) => c.full_name(),
        }
    }
}

/// A delivery together with the records a detail screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDetails {
    pub delivery: Delivery,
    pub sender: Option<Sender>,
    pub recipient: Option<Customer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// Map-display projection of a delivery. Computed, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: u64,
    pub latlng: LatLng,
    pub title: String,
    pub description: String,
}

impl Marker {
    /// Returns `None` when the delivery has no coordinates to place it at.
    /// Missing status or package count are left out of the description.
    pub fn from_delivery(delivery: &Delivery) -> Option<Marker> {
        let latlng = delivery.coordinates()?;
        let mut parts = Vec::with_capacity(2);
        if let Some(status) = &delivery.status {
            parts.push(format!("Status: {status}"));
        }
        if let Some(count) = delivery.number_of_packages {
            parts.push(format!("Packages: {count}"));
        }
        Some(Marker {
            id: delivery.id,
            latlng,
            title: format!("Delivery #{}", delivery.id),
            description: parts.join(", "),
        })
    }
}

/// Request payload for `/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Request payload for the status PUTs on deliveries and packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}
