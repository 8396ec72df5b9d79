//! Fee calculator constants.

use std::time::Duration;

/// The only chain identifier accepted in estimate requests (compared case-insensitively).
pub const SUPPORTED_CHAIN: &str = "tron";

/// The only asset identifier accepted in estimate requests (compared case-insensitively).
pub const SUPPORTED_ASSET: &str = "TRX";

/// Number of SUN in one TRX.
pub const SUN_PER_TRX: u64 = 1_000_000;

/// Number of fractional digits a TRX amount can carry.
pub const TRX_DECIMALS: u32 = 6;

/// On-wire size of a single secp256k1 signature attached to a TRON transaction.
pub const SIGNATURE_SIZE_BYTES: u64 = 65;

/// Maximum number of signatures an estimate may account for.
pub const MAX_SIGNATURE_COUNT: u64 = 10;

/// Signature count used when the request does not specify one.
pub const DEFAULT_SIGNATURE_COUNT: u64 = 1;

/// Bandwidth price in SUN per byte used when the chain does not report `getTransactionFee`.
pub const DEFAULT_BANDWIDTH_PRICE: u64 = 1_000;

/// Chain parameter holding the bandwidth price in SUN per byte.
pub const TRANSACTION_FEE_PARAM: &str = "getTransactionFee";

/// Chain parameter holding the fee for creating an account through a system contract.
pub const CREATE_NEW_ACCOUNT_FEE_PARAM: &str = "getCreateNewAccountFeeInSystemContract";

/// Chain parameter consulted when [`CREATE_NEW_ACCOUNT_FEE_PARAM`] is not reported.
pub const CREATE_ACCOUNT_FEE_PARAM: &str = "getCreateAccountFee";

/// Public TronGrid mainnet endpoint.
///
/// See also <https://developers.tron.network/docs/trongrid>
pub const TRONGRID_MAINNET_URL: &str = "https://api.trongrid.io";

/// Header carrying the TronGrid API key (`TRON-PRO-API-KEY`).
pub const TRON_PRO_API_KEY_HEADER: &str = "tron-pro-api-key";

/// Timeout applied to every gateway request.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default port to serve the HTTP API on.
pub const DEFAULT_HTTP_PORT: u16 = 4000;

/// Default port to serve the metrics on.
pub const DEFAULT_METRICS_PORT: u16 = 9000;

/// Maximum accepted request body size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

/// Requests allowed per client within one wall-clock minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;

/// Requests allowed per client within one wall-clock hour.
pub const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 100;

/// Interval between sweeps of stale rate limit counters.
pub const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);
