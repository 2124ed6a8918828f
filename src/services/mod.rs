pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod payment;
pub mod policy;
pub mod returns;

pub use catalog::CatalogService;
pub use inventory::InventoryCoordinator;
pub use orders::{DeliveredLine, OrderLookup};
pub use payment::{LedgerPaymentService, PaymentCoordinator, PaymentService};
pub use policy::PolicyEvaluator;
pub use returns::ReturnRequestService;
