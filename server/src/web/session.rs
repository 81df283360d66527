//! Typed access to the customer login stored in the session.

use tower_sessions::Session;

use crate::database::{AccountType, CustomerRecord};
use crate::errors::LuberError;

const SESSION_CUSTOMER_ID: &str = "auth:customer_id";
const SESSION_ACCOUNT_TYPE: &str = "auth:account_type";

pub struct CustomerSession<'a> {
    session: &'a Session,
}

impl<'a> CustomerSession<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Logs the customer in, rotating the session id
    pub async fn login(&self, customer: &CustomerRecord) -> Result<(), LuberError> {
        self.session.cycle_id().await?;
        self.session
            .insert(SESSION_CUSTOMER_ID, customer.id.clone())
            .await?;
        self.session
            .insert(SESSION_ACCOUNT_TYPE, customer.account_type.as_str())
            .await?;
        Ok(())
    }

    pub async fn customer_id(&self) -> Result<Option<String>, LuberError> {
        Ok(self.session.get::<String>(SESSION_CUSTOMER_ID).await?)
    }

    pub async fn account_type(&self) -> Result<Option<AccountType>, LuberError> {
        Ok(self
            .session
            .get::<String>(SESSION_ACCOUNT_TYPE)
            .await?
            .map(|t| AccountType::parse(&t)))
    }

    /// Customer id of the logged-in session, or `Unauthorized`
    pub async fn require_customer(&self) -> Result<String, LuberError> {
        self.customer_id().await?.ok_or(LuberError::Unauthorized)
    }

    pub async fn logout(&self) -> Result<(), LuberError> {
        self.session.flush().await?;
        Ok(())
    }
}
