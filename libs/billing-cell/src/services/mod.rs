pub mod gateway;
pub mod invoice;
pub mod settlement;
pub mod wallet;

pub use gateway::{
    sign_payment, verify_payment_signature, OrderCreated, OrderRequest, PaymentGateway,
    RazorpayGateway,
};
pub use invoice::InvoiceService;
pub use settlement::PaymentSettlement;
pub use wallet::WalletLedger;
