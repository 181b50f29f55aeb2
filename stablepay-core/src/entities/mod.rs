pub mod payment_link;

pub use payment_link::{
    GetPaymentLinkById, InsertPaymentLink, LinkStoreError, MemoryPaymentLinkStore, PaymentLink,
    PaymentLinkStore, PgPaymentLinkStore,
};
