mod token_decoder_jwt;

pub use token_decoder_jwt::*;
