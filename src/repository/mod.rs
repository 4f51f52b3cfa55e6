use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod catalog_repository;
pub mod order_repository;
pub mod payment_repository;
pub mod user_repository;

pub use booking_repository::SqliteBookingRepository;
pub use catalog_repository::SqliteCatalogRepository;
pub use order_repository::SqliteOrderRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, request: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_service(&self, service: Service) -> Result<Service>;
    async fn find_service(&self, id: Uuid) -> Result<Option<Service>>;
    async fn create_medicine(&self, medicine: Medicine) -> Result<Medicine>;
    async fn find_medicine(&self, id: Uuid) -> Result<Option<Medicine>>;
    async fn create_equipment(&self, equipment: Equipment) -> Result<Equipment>;
    async fn find_equipment(&self, id: Uuid) -> Result<Option<Equipment>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_booking(&self, id: Uuid) -> Result<Option<ServiceBooking>>;
    async fn list_bookings_for_patient(&self, patient_id: Uuid) -> Result<Vec<ServiceBooking>>;
    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<ServiceBooking>;
    async fn find_appointment(&self, id: Uuid) -> Result<Option<PersonalAppointment>>;
    async fn list_appointments_for_patient(&self, patient_id: Uuid)
        -> Result<Vec<PersonalAppointment>>;
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<PersonalAppointment>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_order(&self, id: Uuid) -> Result<Option<PharmacyOrder>>;
    async fn list_orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<PharmacyOrder>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<PharmacyOrder>;
    async fn find_purchase(&self, id: Uuid) -> Result<Option<EquipmentPurchase>>;
    async fn list_purchases_for_customer(&self, customer_id: Uuid)
        -> Result<Vec<EquipmentPurchase>>;
    async fn update_purchase_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
    ) -> Result<EquipmentPurchase>;
    async fn find_rental(&self, id: Uuid) -> Result<Option<EquipmentRental>>;
    async fn list_rentals_for_customer(&self, customer_id: Uuid) -> Result<Vec<EquipmentRental>>;
    async fn update_rental_status(&self, id: Uuid, status: RentalStatus) -> Result<EquipmentRental>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;
    async fn find_by_chargeable(&self, chargeable: ChargeableRef) -> Result<Vec<Payment>>;
    /// Persist a payment. The payment method is locked once set: changing
    /// it requires `allow_method_change`, which only administrative
    /// correction flows pass. Everything else gets a validation error.
    async fn update(&self, id: Uuid, payment: Payment, allow_method_change: bool)
        -> Result<Payment>;
    async fn save_preference(&self, preference: UserPaymentPreference)
        -> Result<UserPaymentPreference>;
    async fn default_method_for(&self, user_id: Uuid) -> Result<Option<PaymentMethod>>;
}
