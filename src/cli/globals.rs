use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub auth_url: String,
    pub signing_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(auth_url: String, signing_key: SecretString) -> Self {
        Self {
            auth_url,
            signing_key,
        }
    }
}
