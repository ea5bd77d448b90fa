//! Schema migrations
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so running them on each
//! startup is safe. Requires Postgres 13+ for `gen_random_uuid()`.

use sqlx::PgPool;

/// (name, statement) pairs, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            priority TEXT NOT NULL DEFAULT 'medium'
                CHECK (priority IN ('low', 'medium', 'high')),
            status TEXT NOT NULL DEFAULT 'todo'
                CHECK (status IN ('todo', 'in_progress', 'done')),
            due_date DATE,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "transactions",
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
            category TEXT NOT NULL,
            description TEXT,
            occurred_on DATE NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "budgets",
        r#"
        CREATE TABLE IF NOT EXISTS budgets (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            category TEXT NOT NULL,
            month DATE NOT NULL CHECK (EXTRACT(DAY FROM month) = 1),
            amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT budgets_user_category_month_key UNIQUE (user_id, category, month)
        )
        "#,
    ),
    (
        "bills",
        r#"
        CREATE TABLE IF NOT EXISTS bills (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
            category TEXT,
            due_date DATE NOT NULL,
            anchor_day SMALLINT NOT NULL CHECK (anchor_day BETWEEN 1 AND 31),
            recurrence TEXT NOT NULL DEFAULT 'monthly'
                CHECK (recurrence IN ('none', 'weekly', 'monthly', 'yearly')),
            is_paid BOOLEAN NOT NULL DEFAULT FALSE,
            last_paid_on DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT bills_user_name_key UNIQUE (user_id, name)
        )
        "#,
    ),
    (
        "investments",
        r#"
        CREATE TABLE IF NOT EXISTS investments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            symbol TEXT,
            kind TEXT NOT NULL DEFAULT 'other'
                CHECK (kind IN ('stock', 'etf', 'crypto', 'bond', 'fund', 'other')),
            quantity NUMERIC(20, 8) NOT NULL CHECK (quantity > 0),
            purchase_price NUMERIC(14, 2) NOT NULL CHECK (purchase_price >= 0),
            current_price NUMERIC(14, 2) NOT NULL CHECK (current_price >= 0),
            purchased_on DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "debts",
        r#"
        CREATE TABLE IF NOT EXISTS debts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            direction TEXT NOT NULL DEFAULT 'owed' CHECK (direction IN ('owed', 'lent')),
            total_amount NUMERIC(14, 2) NOT NULL CHECK (total_amount > 0),
            remaining_amount NUMERIC(14, 2) NOT NULL CHECK (remaining_amount >= 0),
            interest_rate NUMERIC(6, 3),
            due_date DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT debts_remaining_within_total CHECK (remaining_amount <= total_amount)
        )
        "#,
    ),
    (
        "habits",
        r#"
        CREATE TABLE IF NOT EXISTS habits (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            color TEXT,
            archived BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT habits_user_name_key UNIQUE (user_id, name)
        )
        "#,
    ),
    (
        "habit_logs",
        r#"
        CREATE TABLE IF NOT EXISTS habit_logs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            habit_id UUID NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            log_date DATE NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT habit_logs_habit_date_key UNIQUE (habit_id, log_date)
        )
        "#,
    ),
    (
        "contacts",
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            birthday DATE,
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "events",
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            starts_at TIMESTAMPTZ NOT NULL,
            ends_at TIMESTAMPTZ,
            all_day BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (ends_at IS NULL OR ends_at >= starts_at)
        )
        "#,
    ),
    (
        "gallery_items",
        r#"
        CREATE TABLE IF NOT EXISTS gallery_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            image_url TEXT NOT NULL,
            description TEXT,
            taken_on DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "notes",
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            mood TEXT,
            entry_date DATE NOT NULL DEFAULT CURRENT_DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "shopping_items",
        r#"
        CREATE TABLE IF NOT EXISTS shopping_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity > 0),
            category TEXT,
            estimated_price NUMERIC(14, 2) CHECK (estimated_price >= 0),
            is_purchased BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "problems",
        r#"
        CREATE TABLE IF NOT EXISTS problems (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            url TEXT,
            difficulty TEXT NOT NULL DEFAULT 'medium'
                CHECK (difficulty IN ('easy', 'medium', 'hard')),
            topic TEXT,
            notes TEXT,
            srs_bucket SMALLINT NOT NULL DEFAULT 0 CHECK (srs_bucket BETWEEN 0 AND 5),
            next_review_at TIMESTAMPTZ,
            last_reviewed_at TIMESTAMPTZ,
            review_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT problems_user_title_key UNIQUE (user_id, title)
        )
        "#,
    ),
    (
        "system_design_cases",
        r#"
        CREATE TABLE IF NOT EXISTS system_design_cases (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            prompt TEXT,
            difficulty TEXT NOT NULL DEFAULT 'medium'
                CHECK (difficulty IN ('easy', 'medium', 'hard')),
            notes TEXT,
            srs_bucket SMALLINT NOT NULL DEFAULT 0 CHECK (srs_bucket BETWEEN 0 AND 5),
            next_review_at TIMESTAMPTZ,
            last_reviewed_at TIMESTAMPTZ,
            review_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT system_design_cases_user_title_key UNIQUE (user_id, title)
        )
        "#,
    ),
    (
        "idx_tasks",
        "CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks (user_id, status)",
    ),
    (
        "idx_transactions",
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions (user_id, occurred_on DESC)",
    ),
    (
        "idx_habit_logs",
        "CREATE INDEX IF NOT EXISTS idx_habit_logs_user_date ON habit_logs (user_id, log_date DESC)",
    ),
    (
        "idx_events",
        "CREATE INDEX IF NOT EXISTS idx_events_user_start ON events (user_id, starts_at)",
    ),
    (
        "idx_problems_due",
        "CREATE INDEX IF NOT EXISTS idx_problems_user_due ON problems (user_id, next_review_at)",
    ),
    (
        "idx_design_due",
        "CREATE INDEX IF NOT EXISTS idx_design_user_due ON system_design_cases (user_id, next_review_at)",
    ),
];

/// Run all migrations in order.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!(count = MIGRATIONS.len(), "Running migrations");

    for (name, statement) in MIGRATIONS {
        tracing::debug!(migration = name, "Applying");
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

/// Names of all migrations, in application order.
pub fn names() -> impl Iterator<Item = &'static str> {
    MIGRATIONS.iter().map(|(name, _)| *name)
}
