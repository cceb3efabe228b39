//! Customer account operations (Storefront API classic customer accounts).
//!
//! Customers sign in with email and password; Shopify returns a customer
//! access token that is stored in the visitor session and passed back on
//! every customer query.

use indecisive_wear_core::Email;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::shopify::types::{Customer, CustomerAccessToken, CustomerCreateInput};
use crate::shopify::{GraphQLError, ShopifyError};

use super::conversions::convert_customer;
use super::queries::{
    CustomerAccessTokenCreate, CustomerAccessTokenDelete, CustomerCreate, CustomerRecover,
    GetCustomer, customer_access_token_create, customer_access_token_delete, customer_create,
    customer_recover, get_customer,
};
use super::{StorefrontClient, join_user_errors};

/// Orders shown on the account page.
const RECENT_ORDER_COUNT: i64 = 20;

impl StorefrontClient {
    /// Register a new customer. Returns the customer id.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` when Shopify rejects the input
    /// (email taken, weak password), or an error if the request fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn customer_create(&self, input: CustomerCreateInput) -> Result<String, ShopifyError> {
        let variables = customer_create::Variables {
            input: customer_create::CustomerCreateInput {
                email: input.email,
                password: input.password.expose_secret().to_string(),
                first_name: input.first_name,
                last_name: input.last_name,
                accepts_marketing: input.accepts_marketing,
            },
        };

        let data = self.execute::<CustomerCreate>(variables).await?;
        let payload = data.customer_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message("Failed to create customer")])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::UserError(join_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload.customer.map(|c| c.id).ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message("Failed to create customer")])
        })
    }

    /// Exchange email and password for a customer access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` for unknown credentials, or an error
    /// if the request fails.
    #[instrument(skip(self, email, password), fields(domain = %email.domain()))]
    pub async fn customer_access_token_create(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let variables = customer_access_token_create::Variables {
            input: customer_access_token_create::CustomerAccessTokenCreateInput {
                email: email.as_str().to_string(),
                password: password.expose_secret().to_string(),
            },
        };

        let data = self.execute::<CustomerAccessTokenCreate>(variables).await?;
        let payload = data.customer_access_token_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message("Failed to sign in")])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::UserError(join_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload
            .customer_access_token
            .map(|token| CustomerAccessToken {
                access_token: SecretString::from(token.access_token),
                expires_at: token.expires_at,
            })
            .ok_or_else(|| ShopifyError::UserError("Invalid email or password".to_string()))
    }

    /// Revoke a customer access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self, token))]
    pub async fn customer_access_token_delete(
        &self,
        token: &CustomerAccessToken,
    ) -> Result<(), ShopifyError> {
        let data = self
            .execute::<CustomerAccessTokenDelete>(customer_access_token_delete::Variables {
                customer_access_token: token.token().to_string(),
            })
            .await?;

        match data.customer_access_token_delete {
            Some(payload) if !payload.user_errors.is_empty() => Err(ShopifyError::UserError(
                join_user_errors(payload.user_errors),
            )),
            _ => Ok(()),
        }
    }

    /// Ask Shopify to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self, email), fields(domain = %email.domain()))]
    pub async fn customer_recover(&self, email: &Email) -> Result<(), ShopifyError> {
        let data = self
            .execute::<CustomerRecover>(customer_recover::Variables {
                email: email.as_str().to_string(),
            })
            .await?;

        match data.customer_recover {
            Some(payload) if !payload.customer_user_errors.is_empty() => Err(
                ShopifyError::UserError(join_user_errors(payload.customer_user_errors)),
            ),
            _ => Ok(()),
        }
    }

    /// Fetch the signed-in customer with their most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` when the token is no longer valid, or
    /// an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_customer(&self, token: &CustomerAccessToken) -> Result<Customer, ShopifyError> {
        let data = self
            .execute::<GetCustomer>(get_customer::Variables {
                customer_access_token: token.token().to_string(),
                order_count: RECENT_ORDER_COUNT,
            })
            .await?;

        let customer = data
            .customer
            .ok_or_else(|| ShopifyError::NotFound("Customer not found".to_string()))?;
        Ok(convert_customer(customer)?)
    }
}
