use tracing::info;

use crate::customer::{Address, Customer};
use crate::error::{ErrorKind, PaymentError, Result};
use crate::repository::SharedRepository;
use crate::validator;

/// Customer registration and loyalty bookkeeping
#[derive(Clone)]
pub struct CustomerService {
    repo: SharedRepository,
}

impl CustomerService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    /// Validate and store a new customer. Email addresses are unique.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        phone: Option<&str>,
        address: Option<Address>,
    ) -> Result<Customer> {
        validator::validate_email(email)?;
        if name.trim().is_empty() {
            return Err(PaymentError::Validation("name is required".into()));
        }
        if let Some(phone) = phone {
            validator::validate_phone(phone)?;
        }
        if let Some(address) = &address {
            validator::validate_address(address)?;
        }

        match self.repo.get_customer_by_email(email).await {
            Ok(_) => return Err(PaymentError::already_exists("customer", email)),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let mut customer = Customer::new(email, name.trim());
        if let Some(phone) = phone {
            customer = customer.with_phone(phone);
        }
        if let Some(address) = address {
            customer = customer.with_address(address);
        }
        let customer = self.repo.create_customer(customer).await?;
        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn get(&self, id: &str) -> Result<Customer> {
        self.repo.get_customer(id).await
    }

    /// Apply earned and redeemed points; the balance never drops below zero
    pub async fn update_loyalty_points(&self, id: &str, earned: u64, redeemed: u64) -> Result<Customer> {
        let mut customer = self.repo.get_customer(id).await?;
        let before = customer.loyalty_points;
        customer.loyalty_points = before.saturating_add(earned).saturating_sub(redeemed);
        let customer = self.repo.update_customer(customer).await?;
        info!(
            customer_id = id,
            earned,
            redeemed,
            before,
            after = customer.loyalty_points,
            "Loyalty points updated"
        );
        Ok(customer)
    }
}
