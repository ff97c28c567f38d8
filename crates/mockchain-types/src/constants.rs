//! System-wide constants for the Mockchain wallet.

/// Decimal places shown for crypto amounts in approval messages.
pub const CRYPTO_DISPLAY_DECIMALS: u32 = 6;

/// Decimal places shown for fiat amounts in approval messages.
pub const FIAT_DISPLAY_DECIMALS: u32 = 2;

/// Fiat minor-unit scale used on the oracle wire (USDC has 6 decimals).
pub const FIAT_MINOR_UNIT_DECIMALS: u32 = 6;

/// Crypto minor-unit scale used on the oracle wire (wei).
pub const CRYPTO_MINOR_UNIT_DECIMALS: u32 = 18;

/// Decimal places kept for faucet opening balances.
pub const OPENING_BALANCE_DECIMALS: u32 = 4;

/// Hex characters of the SHA-256 digest kept as an approval nonce.
pub const NONCE_HEX_LEN: usize = 16;

/// BIP-44 derivation path template; `{index}` is the address index.
pub const DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0";

/// Entropy behind a generated seed phrase (12 words).
pub const SEED_ENTROPY_BYTES: usize = 16;

/// Default approval lifetime in seconds.
pub const DEFAULT_APPROVAL_TTL_SECS: u64 = 300;

/// Default number of retired nonces remembered.
pub const DEFAULT_RETIRED_NONCE_CAPACITY: usize = 100_000;

/// Default number of nonce candidates tried before giving up.
pub const DEFAULT_MAX_NONCE_ATTEMPTS: u32 = 16;

/// Default oracle request timeout in seconds.
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

/// Default Skip Go `msgs_direct` endpoint.
pub const DEFAULT_ORACLE_ENDPOINT: &str = "https://api.skip.build/v2/fungible/msgs_direct";

/// USDC on Ethereum mainnet.
pub const DEFAULT_SOURCE_ASSET_DENOM: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Native ether denom as the oracle names it.
pub const DEFAULT_DEST_ASSET_DENOM: &str = "ethereum-native";

/// Ethereum mainnet chain id.
pub const DEFAULT_CHAIN_ID: &str = "1";

/// Placeholder recipient the oracle requires for route construction.
pub const DEFAULT_RECIPIENT_PLACEHOLDER: &str = "0x742d35Cc6634C0532925a3b8D4C9db96c728b0B4";

/// Slippage percentage sent to the oracle.
pub const DEFAULT_SLIPPAGE_PERCENT: &str = "1";

/// Product name used in notices.
pub const WALLET_NAME: &str = "Mock Web3 Wallet";
