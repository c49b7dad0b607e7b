//! Public gift card search by code or by recipient/buyer name.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::voucher::Voucher;
use crate::ports::VoucherRepository;

/// What the query string is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Exact match on the printed code, case-normalized.
    Code,
    /// Substring match over recipient and buyer names.
    Recipient,
}

impl SearchKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "code" => Some(Self::Code),
            "recipient" => Some(Self::Recipient),
            _ => None,
        }
    }
}

/// Looks gift cards up for the counter terminal: a buyer presenting a
/// printed code, or a card retrieved by whoever bought it or received it.
pub struct SearchVouchers {
    vouchers: Arc<dyn VoucherRepository>,
}

impl SearchVouchers {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    pub async fn execute(
        &self,
        query: &str,
        kind: SearchKind,
    ) -> Result<Vec<Voucher>, DomainError> {
        match kind {
            SearchKind::Code => {
                let normalized = query.trim().to_uppercase();
                let hit = self.vouchers.find_by_code(&normalized).await?;
                Ok(hit.into_iter().collect())
            }
            SearchKind::Recipient => self.vouchers.search_by_name(query.trim()).await,
        }
    }
}
