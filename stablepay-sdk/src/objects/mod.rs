pub mod assets;
pub mod chains;
pub mod intent;
pub mod payment;
pub mod relay;
pub mod tokens;

pub use assets::{AssetKey, UserAsset};
pub use chains::Chain;
pub use intent::{Intent, IntentWithQuote, Quote, Reward, Route, RouteCall, TokenAmount};
pub use payment::{
    PaymentLinkCreated, PaymentParams, RequiredPaymentParams, ValidatedPaymentParams,
    ValidationReport,
};
pub use tokens::{Stablecoin, TokenDeployment};
