//! Accounting service: chart of accounts and double-entry journals
//!
//! Journal entries only come into existence through the balanced-entry
//! constructor; an entry whose debits and credits differ is rejected
//! before anything is written. Posting an entry bumps the cached account
//! balances in the same transaction that flips the posted flag.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{AccountType, JournalType};
use shared::validation::{validate_entity_code, validate_journal_lines};

use crate::error::{AppError, AppResult};
use crate::services::document::{next_document_number, DocType};

/// Accounting service
#[derive(Clone)]
pub struct AccountingService {
    db: PgPool,
}

/// Accounts created for every new branch
pub const DEFAULT_ACCOUNTS: &[(&str, &str, AccountType)] = &[
    ("1000", "Kas", AccountType::Asset),
    ("1100", "Piutang Usaha", AccountType::Asset),
    ("1200", "Persediaan", AccountType::Asset),
    ("2000", "Utang Usaha", AccountType::Liability),
    ("3000", "Modal", AccountType::Equity),
    ("4000", "Pendapatan Penjualan", AccountType::Revenue),
    ("4100", "Pendapatan Servis", AccountType::Revenue),
    ("5000", "Harga Pokok Penjualan", AccountType::Expense),
];

/// A chart-of-accounts row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CoaAccountRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A journal entry row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub journal_type: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_posted: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A journal line row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JournalLineRow {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry with its lines
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntryWithLines {
    #[serde(flatten)]
    pub entry: JournalEntryRow,
    pub lines: Vec<JournalLineRow>,
}

/// Input for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateAccountInput {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<Uuid>,
}

/// One line of a journal entry to create
#[derive(Debug, Clone, Deserialize)]
pub struct JournalLineInput {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

/// Input for creating a journal entry
#[derive(Debug, Deserialize)]
pub struct CreateJournalInput {
    pub entry_date: Option<NaiveDate>,
    pub journal_type: JournalType,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub lines: Vec<JournalLineInput>,
    /// Post immediately after creating
    #[serde(default)]
    pub post: bool,
}

impl AccountingService {
    /// Create a new AccountingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a chart-of-accounts account
    pub async fn create_account(
        &self,
        branch_id: Uuid,
        input: CreateAccountInput,
    ) -> AppResult<CoaAccountRow> {
        validate_entity_code(&input.code).map_err(|msg| {
            AppError::validation("code", msg, "Kode akun harus 2-10 huruf kapital/angka")
        })?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM coa_accounts WHERE branch_id = $1 AND code = $2)",
        )
        .bind(branch_id)
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("account code".to_string()));
        }

        let account = sqlx::query_as::<_, CoaAccountRow>(
            r#"
            INSERT INTO coa_accounts (branch_id, code, name, account_type, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, branch_id, code, name, account_type, parent_id, is_active, balance, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.account_type.as_str())
        .bind(input.parent_id)
        .fetch_one(&self.db)
        .await?;

        Ok(account)
    }

    /// List accounts for a branch
    pub async fn list_accounts(&self, branch_id: Uuid) -> AppResult<Vec<CoaAccountRow>> {
        let accounts = sqlx::query_as::<_, CoaAccountRow>(
            r#"
            SELECT id, branch_id, code, name, account_type, parent_id, is_active, balance, created_at
            FROM coa_accounts
            WHERE branch_id = $1
            ORDER BY code
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(accounts)
    }

    /// Create a journal entry (and optionally post it)
    pub async fn create_entry(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        input: CreateJournalInput,
    ) -> AppResult<JournalEntryWithLines> {
        let mut tx = self.db.begin().await?;
        let entry = Self::create_entry_in_tx(
            &mut tx,
            branch_id,
            Some(user_id),
            input.journal_type,
            input.entry_date.unwrap_or_else(|| Utc::now().date_naive()),
            input.reference_type.as_deref(),
            input.reference_id,
            input.description.as_deref(),
            &input.lines,
            input.post,
        )
        .await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Create (and optionally post) a journal entry inside an existing
    /// transaction. Checkout and ticket settlement use this so the entry
    /// commits together with the document it records.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn create_entry_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        user_id: Option<Uuid>,
        journal_type: JournalType,
        entry_date: NaiveDate,
        reference_type: Option<&str>,
        reference_id: Option<Uuid>,
        description: Option<&str>,
        lines: &[JournalLineInput],
        post: bool,
    ) -> AppResult<JournalEntryWithLines> {
        // Balance check before any write
        let amounts: Vec<(Decimal, Decimal)> =
            lines.iter().map(|l| (l.debit, l.credit)).collect();
        validate_journal_lines(&amounts)
            .map_err(|msg| AppError::UnbalancedJournal(msg.to_string()))?;

        for line in lines {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM coa_accounts WHERE id = $1 AND branch_id = $2 AND is_active = true)",
            )
            .bind(line.account_id)
            .bind(branch_id)
            .fetch_one(&mut **tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Account".to_string()));
            }
        }

        let total_debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.credit).sum();

        let entry_number =
            next_document_number(&mut **tx, branch_id, DocType::JournalEntry).await?;

        let entry = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            INSERT INTO journal_entries (
                branch_id, entry_number, entry_date, journal_type, reference_type,
                reference_id, description, total_debit, total_credit, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, branch_id, entry_number, entry_date, journal_type, reference_type,
                      reference_id, description, total_debit, total_credit, is_posted,
                      created_by, created_at
            "#,
        )
        .bind(branch_id)
        .bind(&entry_number)
        .bind(entry_date)
        .bind(journal_type.as_str())
        .bind(reference_type)
        .bind(reference_id)
        .bind(description)
        .bind(total_debit)
        .bind(total_credit)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        let mut line_rows = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, JournalLineRow>(
                r#"
                INSERT INTO journal_lines (entry_id, account_id, debit, credit, description)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, entry_id, account_id, debit, credit, description, created_at
                "#,
            )
            .bind(entry.id)
            .bind(line.account_id)
            .bind(line.debit)
            .bind(line.credit)
            .bind(&line.description)
            .fetch_one(&mut **tx)
            .await?;
            line_rows.push(row);
        }

        let entry = if post {
            Self::post_entry_in_tx(tx, branch_id, entry.id).await?
        } else {
            entry
        };

        Ok(JournalEntryWithLines {
            entry,
            lines: line_rows,
        })
    }

    /// Post a journal entry: flip the flag and bump account balances
    pub async fn post_entry(&self, branch_id: Uuid, entry_id: Uuid) -> AppResult<JournalEntryRow> {
        let mut tx = self.db.begin().await?;
        let entry = Self::post_entry_in_tx(&mut tx, branch_id, entry_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn post_entry_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        entry_id: Uuid,
    ) -> AppResult<JournalEntryRow> {
        let posted: Option<bool> = sqlx::query_scalar(
            "SELECT is_posted FROM journal_entries WHERE id = $1 AND branch_id = $2 FOR UPDATE",
        )
        .bind(entry_id)
        .bind(branch_id)
        .fetch_optional(&mut **tx)
        .await?;

        match posted {
            None => return Err(AppError::NotFound("Journal entry".to_string())),
            Some(true) => {
                return Err(AppError::Conflict {
                    resource: "journal_entry".to_string(),
                    message: "Journal entry is already posted".to_string(),
                    message_id: "Jurnal sudah diposting".to_string(),
                })
            }
            Some(false) => {}
        }

        let lines = sqlx::query_as::<_, JournalLineRow>(
            "SELECT id, entry_id, account_id, debit, credit, description, created_at FROM journal_lines WHERE entry_id = $1",
        )
        .bind(entry_id)
        .fetch_all(&mut **tx)
        .await?;

        for line in &lines {
            let account_type: String = sqlx::query_scalar(
                "SELECT account_type FROM coa_accounts WHERE id = $1 FOR UPDATE",
            )
            .bind(line.account_id)
            .fetch_one(&mut **tx)
            .await?;

            let account_type = AccountType::from_str(&account_type)
                .ok_or_else(|| AppError::Internal(format!("Unknown account type {}", account_type)))?;

            // Debit-normal accounts grow with debits, the rest with credits
            let change = if account_type.debit_increases() {
                line.debit - line.credit
            } else {
                line.credit - line.debit
            };

            sqlx::query("UPDATE coa_accounts SET balance = balance + $1 WHERE id = $2")
                .bind(change)
                .bind(line.account_id)
                .execute(&mut **tx)
                .await?;
        }

        let entry = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            UPDATE journal_entries SET is_posted = true
            WHERE id = $1
            RETURNING id, branch_id, entry_number, entry_date, journal_type, reference_type,
                      reference_id, description, total_debit, total_credit, is_posted,
                      created_by, created_at
            "#,
        )
        .bind(entry_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(entry)
    }

    /// Look up an account id by its code inside a transaction
    pub(crate) async fn account_id_by_code(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        code: &str,
    ) -> AppResult<Uuid> {
        sqlx::query_scalar("SELECT id FROM coa_accounts WHERE branch_id = $1 AND code = $2")
            .bind(branch_id)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {}", code)))
    }

    /// Seed the default chart of accounts for a new branch
    pub(crate) async fn seed_default_accounts(
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
    ) -> AppResult<()> {
        for (code, name, account_type) in DEFAULT_ACCOUNTS {
            sqlx::query(
                "INSERT INTO coa_accounts (branch_id, code, name, account_type) VALUES ($1, $2, $3, $4)",
            )
            .bind(branch_id)
            .bind(code)
            .bind(name)
            .bind(account_type.as_str())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// List journal entries for a branch, newest first
    pub async fn list_entries(
        &self,
        branch_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<JournalEntryRow>> {
        let entries = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, branch_id, entry_number, entry_date, journal_type, reference_type,
                   reference_id, description, total_debit, total_credit, is_posted,
                   created_by, created_at
            FROM journal_entries
            WHERE branch_id = $1
            ORDER BY entry_date DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Get one entry with its lines
    pub async fn get_entry(
        &self,
        branch_id: Uuid,
        entry_id: Uuid,
    ) -> AppResult<JournalEntryWithLines> {
        let entry = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, branch_id, entry_number, entry_date, journal_type, reference_type,
                   reference_id, description, total_debit, total_credit, is_posted,
                   created_by, created_at
            FROM journal_entries
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(entry_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?;

        let lines = sqlx::query_as::<_, JournalLineRow>(
            "SELECT id, entry_id, account_id, debit, credit, description, created_at FROM journal_lines WHERE entry_id = $1 ORDER BY created_at",
        )
        .bind(entry_id)
        .fetch_all(&self.db)
        .await?;

        Ok(JournalEntryWithLines { entry, lines })
    }
}
