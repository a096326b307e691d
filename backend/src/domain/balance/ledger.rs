//! Balance ledger operations.
//!
//! Each function runs inside the caller's unit of work and performs its
//! guard, balance update, and ledger append there. Nothing here commits.
//! On error the caller rolls back, so a failed operation leaves no partial
//! state.
//!
//! Lock order is deposit request first, then balance row.

use serde::Serialize;

use crate::domain::foundation::{AdminId, BalanceRequestId, Timestamp, UserId};
use crate::ports::BalanceStore;

use super::{
    BalanceError, BalanceLedgerEntry, BalanceRequest, LedgerEntryType, NewLedgerEntry, UserBalance,
};

/// A deposit request together with its audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRequestCreated {
    pub request: BalanceRequest,
    pub entry: BalanceLedgerEntry,
}

/// Outcome of approving or rejecting a deposit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositResolution {
    pub request: BalanceRequest,
    pub entry: BalanceLedgerEntry,
    pub balance_cents: i64,
}

/// Outcome of a direct admin adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceAdjustment {
    pub entry: BalanceLedgerEntry,
    pub balance_cents: i64,
}

/// Parameters for [`admin_adjust_balance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustBalance {
    pub user: UserId,
    pub delta_cents: i64,
    pub admin: AdminId,
    pub comment: Option<String>,
    pub allow_negative: bool,
}

/// Returns the user's balance row, creating a zero row on first use.
///
/// The returned row is locked for the rest of the unit of work.
pub async fn get_or_create_balance<S>(uow: &mut S, user: UserId) -> Result<UserBalance, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    uow.ensure_balance(user).await?;
    uow.lock_balance(user)
        .await?
        .ok_or_else(|| BalanceError::infrastructure(format!("balance row missing for user {}", user)))
}

/// Appends a ledger row.
///
/// Callers must already hold the balance lock and pass the post-mutation
/// balance in `entry.balance_after_cents`.
pub async fn append_ledger_entry<S>(uow: &mut S, entry: NewLedgerEntry) -> Result<BalanceLedgerEntry, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    let entry = uow.insert_ledger_entry(entry).await?;
    tracing::debug!(
        user_id = %entry.user_id,
        entry_id = %entry.id,
        entry_type = %entry.entry_type,
        delta_cents = entry.delta_cents,
        balance_after_cents = entry.balance_after_cents,
        "ledger entry appended"
    );
    Ok(entry)
}

/// Records a user's claim that they sent funds.
///
/// Creates a pending request and a zero-delta audit row.
pub async fn create_deposit_request<S>(
    uow: &mut S,
    user: UserId,
    tx_ref: &str,
) -> Result<DepositRequestCreated, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    let tx_ref = BalanceRequest::normalize_tx_ref(tx_ref)?;
    let request = uow.insert_balance_request(user, &tx_ref, Timestamp::now()).await?;
    let balance = get_or_create_balance(uow, user).await?;

    let entry = append_ledger_entry(
        uow,
        NewLedgerEntry::new(user, LedgerEntryType::DepositRequestCreated, 0, balance.balance_cents)
            .with_request(request.id),
    )
    .await?;

    tracing::info!(user_id = %user, request_id = %request.id, "deposit request created");
    Ok(DepositRequestCreated { request, entry })
}

/// Approves a pending deposit request and credits `amount_cents`.
///
/// # Errors
///
/// - `ValidationFailed` if `amount_cents <= 0`
/// - `RequestNotFound` if the request does not exist
/// - `Conflict` if the request is not pending
pub async fn approve_deposit_request<S>(
    uow: &mut S,
    request_id: BalanceRequestId,
    amount_cents: i64,
    admin: AdminId,
    comment: Option<String>,
) -> Result<DepositResolution, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    if amount_cents <= 0 {
        return Err(BalanceError::validation("amount_cents", "must be greater than zero"));
    }

    let comment = normalize_comment(comment);
    let mut request = uow
        .lock_balance_request(request_id)
        .await?
        .ok_or_else(|| BalanceError::request_not_found(request_id))?;

    if let Err(err) = request.approve(admin, comment.clone()) {
        tracing::warn!(request_id = %request_id, status = %request.status, "approve rejected");
        return Err(err);
    }

    let mut balance = get_or_create_balance(uow, request.user_id).await?;
    let balance_after = balance.credit(amount_cents)?;
    uow.save_balance(&balance).await?;

    let entry = append_ledger_entry(
        uow,
        NewLedgerEntry::new(
            request.user_id,
            LedgerEntryType::DepositRequestApproved,
            amount_cents,
            balance_after,
        )
        .with_request(request_id)
        .with_admin(admin)
        .with_comment(comment),
    )
    .await?;

    uow.save_balance_request(&request).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        admin_id = %admin,
        amount_cents,
        balance_after,
        "deposit request approved"
    );

    Ok(DepositResolution {
        request,
        entry,
        balance_cents: balance_after,
    })
}

/// Rejects a pending deposit request. The balance is unchanged.
///
/// # Errors
///
/// - `RequestNotFound` if the request does not exist
/// - `Conflict` if the request is not pending
pub async fn reject_deposit_request<S>(
    uow: &mut S,
    request_id: BalanceRequestId,
    admin: AdminId,
    comment: Option<String>,
) -> Result<DepositResolution, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    let comment = normalize_comment(comment);
    let mut request = uow
        .lock_balance_request(request_id)
        .await?
        .ok_or_else(|| BalanceError::request_not_found(request_id))?;

    if let Err(err) = request.reject(admin, comment.clone()) {
        tracing::warn!(request_id = %request_id, status = %request.status, "reject rejected");
        return Err(err);
    }

    let balance = get_or_create_balance(uow, request.user_id).await?;

    let entry = append_ledger_entry(
        uow,
        NewLedgerEntry::new(
            request.user_id,
            LedgerEntryType::DepositRequestRejected,
            0,
            balance.balance_cents,
        )
        .with_request(request_id)
        .with_admin(admin)
        .with_comment(comment),
    )
    .await?;

    uow.save_balance_request(&request).await?;

    tracing::info!(request_id = %request_id, admin_id = %admin, "deposit request rejected");

    Ok(DepositResolution {
        request,
        entry,
        balance_cents: balance.balance_cents,
    })
}

/// Applies a signed admin correction.
///
/// # Errors
///
/// - `ValidationFailed` if `delta_cents == 0`
/// - `InvariantViolation` if the balance would go negative without
///   `allow_negative`
pub async fn admin_adjust_balance<S>(uow: &mut S, adjust: AdjustBalance) -> Result<BalanceAdjustment, BalanceError>
where
    S: BalanceStore + ?Sized,
{
    if adjust.delta_cents == 0 {
        return Err(BalanceError::validation("delta_cents", "must not be zero"));
    }

    let mut balance = get_or_create_balance(uow, adjust.user).await?;
    let balance_after = match balance.apply_delta(adjust.delta_cents, adjust.allow_negative) {
        Ok(after) => after,
        Err(err) => {
            tracing::warn!(
                user_id = %adjust.user,
                current = balance.balance_cents,
                delta_cents = adjust.delta_cents,
                "adjustment would overdraw balance"
            );
            return Err(err);
        }
    };
    uow.save_balance(&balance).await?;

    let entry = append_ledger_entry(
        uow,
        NewLedgerEntry::new(adjust.user, LedgerEntryType::AdminAdjust, adjust.delta_cents, balance_after)
            .with_admin(adjust.admin)
            .with_comment(normalize_comment(adjust.comment)),
    )
    .await?;

    tracing::info!(
        user_id = %adjust.user,
        admin_id = %adjust.admin,
        delta_cents = adjust.delta_cents,
        balance_after,
        allow_negative = adjust.allow_negative,
        "balance adjusted"
    );

    Ok(BalanceAdjustment {
        entry,
        balance_cents: balance_after,
    })
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
