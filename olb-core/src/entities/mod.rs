pub mod availability_blocks;
pub mod bonuses;
pub mod bookings;
pub mod bulk_lessons;
pub mod lessons;
pub mod payment_records;
pub mod special_slots;
pub mod users;
pub mod wallets;

use olb_sdk::objects::SlotPaymentStatus as SdkSlotPaymentStatus;

/// Account role for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "user_role")]
pub enum UserRole {
    Student,
    Teacher,
}

/// What a confirmed payment bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "payment_kind")]
pub enum PaymentKind {
    Lesson,
    WalletTopup,
    Bulk,
    Bonus,
}

/// Direction of a wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "wallet_direction")]
pub enum WalletDirection {
    Credit,
    Debit,
}

/// Payment state of a special slot for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `olb_sdk::objects::SlotPaymentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "slot_payment_status")]
pub enum SlotPaymentStatus {
    Pending,
    Paid,
}

impl From<SlotPaymentStatus> for SdkSlotPaymentStatus {
    fn from(value: SlotPaymentStatus) -> Self {
        match value {
            SlotPaymentStatus::Pending => SdkSlotPaymentStatus::Pending,
            SlotPaymentStatus::Paid => SdkSlotPaymentStatus::Paid,
        }
    }
}

impl From<SdkSlotPaymentStatus> for SlotPaymentStatus {
    fn from(value: SdkSlotPaymentStatus) -> Self {
        match value {
            SdkSlotPaymentStatus::Pending => SlotPaymentStatus::Pending,
            SdkSlotPaymentStatus::Paid => SlotPaymentStatus::Paid,
        }
    }
}
