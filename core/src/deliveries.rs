//! Delivery and package synchronization operations.
//!
//! Each method is one courier-facing action composed from `Session` calls.
//! Failures come back as `SyncError` naming the action; nothing is retried
//! or cached. Status updates return the record the server accepted, and
//! callers replace their local copy with it instead of patching.

use crate::client::endpoints;
use crate::error::{ApiError, Operation, SyncError};
use crate::http::Transport;
use crate::session::Session;
use crate::token::TokenStore;
use crate::types::{
    decode_deliveries, Business, Customer, Delivery, DeliveryDetails, DeliveryStatus, LoginRequest,
    LoginResponse, Marker, Package, PackageStatus, Sender, SenderRef, StatusUpdate,
};

#[derive(Debug)]
pub struct DeliveryService<T, S> {
    session: Session<T, S>,
}

impl<T: Transport, S: TokenStore> DeliveryService<T, S> {
    pub fn new(session: Session<T, S>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<T, S> {
        &self.session
    }

    /// Log in and persist the returned token. The store is only written on
    /// success.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<(), SyncError> {
        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self
            .session
            .login::<_, LoginResponse>(endpoints::LOGIN, &credentials)
            .and_then(|response| self.session.store().set(&response.token));
        match result {
            Ok(()) => {
                tracing::info!("courier logged in");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                Err(SyncError::Authentication(e))
            }
        }
    }

    pub fn logout(&self) -> Result<(), SyncError> {
        self.session
            .store()
            .clear()
            .map_err(SyncError::during(Operation::Logout))?;
        tracing::info!("courier logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.store().get().is_some()
    }

    /// All deliveries as map markers. Records that fail validation and
    /// deliveries without coordinates are skipped.
    pub fn list_deliveries(&self) -> Result<Vec<Marker>, SyncError> {
        let records: Vec<serde_json::Value> = self
            .session
            .get(endpoints::DELIVERIES)
            .map_err(failed(Operation::ListDeliveries))?;

        let markers = decode_deliveries(records)
            .iter()
            .filter_map(|delivery| {
                let marker = Marker::from_delivery(delivery);
                if marker.is_none() {
                    tracing::warn!(delivery_id = delivery.id, "delivery has no coordinates, skipping marker");
                }
                marker
            })
            .collect();
        Ok(markers)
    }

    /// Fetch a delivery, then its sender (business or customer, never both)
    /// and its recipient.
    pub fn get_delivery(&self, id: u64) -> Result<DeliveryDetails, SyncError> {
        let delivery: Delivery = self
            .session
            .get(&endpoints::delivery(id))
            .map_err(failed(Operation::GetDelivery))?;

        let sender = match delivery.sender {
            Some(SenderRef::Business(business_id)) => {
                Some(Sender::Business(self.fetch_business(business_id, Operation::GetDelivery)?))
            }
            Some(SenderRef::Customer(sender_id)) => {
                Some(Sender::Customer(self.fetch_customer(sender_id, Operation::GetDelivery)?))
            }
            None => None,
        };

        let recipient = match delivery.recipient_id {
            Some(recipient_id) => Some(self.fetch_customer(recipient_id, Operation::GetDelivery)?),
            None => None,
        };

        Ok(DeliveryDetails {
            delivery,
            sender,
            recipient,
        })
    }

    pub fn get_business(&self, id: u64) -> Result<Business, SyncError> {
        self.fetch_business(id, Operation::GetBusiness)
    }

    pub fn get_customer(&self, id: u64) -> Result<Customer, SyncError> {
        self.fetch_customer(id, Operation::GetCustomer)
    }

    pub fn get_packages(&self, delivery_id: u64) -> Result<Vec<Package>, SyncError> {
        self.session
            .get(&endpoints::packages(delivery_id))
            .map_err(failed(Operation::GetPackages))
    }

    pub fn set_package_status(
        &self,
        delivery_id: u64,
        package_id: u64,
        status: PackageStatus,
    ) -> Result<Package, SyncError> {
        self.session
            .put(
                &endpoints::package(delivery_id, package_id),
                &StatusUpdate { status },
            )
            .map_err(failed(Operation::SetPackageStatus))
    }

    /// Flip a package between `delivered` and `incomplete`.
    pub fn toggle_package(&self, delivery_id: u64, package: &Package) -> Result<Package, SyncError> {
        self.set_package_status(delivery_id, package.id, package.status.toggled())
    }

    /// Mark the delivery completed. Package states are not checked here; see
    /// [`all_delivered`].
    pub fn complete_delivery(&self, delivery_id: u64) -> Result<Delivery, SyncError> {
        self.session
            .put(
                &endpoints::delivery(delivery_id),
                &StatusUpdate {
                    status: DeliveryStatus::Completed,
                },
            )
            .map_err(failed(Operation::CompleteDelivery))
    }

    fn fetch_business(&self, id: u64, operation: Operation) -> Result<Business, SyncError> {
        self.session
            .get(&endpoints::business(id))
            .map_err(failed(operation))
    }

    fn fetch_customer(&self, id: u64, operation: Operation) -> Result<Customer, SyncError> {
        self.session
            .get(&endpoints::customer(id))
            .map_err(failed(operation))
    }
}

/// Whether every package is delivered. An empty list is not.
pub fn all_delivered(packages: &[Package]) -> bool {
    !packages.is_empty() && packages.iter().all(|p| p.status.is_delivered())
}

fn failed(operation: Operation) -> impl FnOnce(ApiError) -> SyncError {
    move |source| {
        tracing::warn!(%operation, error = %source, "operation failed");
        SyncError::during(operation)(source)
    }
}
