pub mod authenticator;
pub mod session;
pub mod token;

pub use authenticator::Authenticator;
pub use session::SessionTokenizer;
pub use token::BearerToken;
