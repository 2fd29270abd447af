pub mod did_signer;
pub mod http_client;
pub mod oauth1;
pub mod tokenization;
