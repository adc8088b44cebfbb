// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DATABASE_FILE: &str = "expenses.db";
pub const DEFAULT_LOG_FILTER: &str = "expense_tracker_server=debug,tower_http=info";

// Session configuration
pub const SESSION_NAME: &str = "expense_session";
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

// Session keys
pub const SESSION_KEY_ID: &str = "session_id";

// Preference defaults
pub const DEFAULT_CURRENCY: &str = "OMR";
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const DEFAULT_THEME: &str = "light";

// Export
pub const CSV_HEADER: &str = "id,category,amount,date";
pub const CSV_FILENAME: &str = "expenses.csv";

// Error messages
pub const ERR_AUTH_REQUIRED: &str = "Authentication required";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ERR_REGISTER_FIELDS: &str = "All fields are required";
pub const ERR_LOGIN_FIELDS: &str = "Email and password are required";
pub const ERR_USER_EXISTS: &str = "User already exists";
pub const ERR_EXPENSE_FIELDS: &str = "Category, amount, and date are required";
pub const ERR_EXPENSE_NOT_FOUND: &str = "Expense not found";
pub const ERR_INTERNAL: &str = "Something went wrong!";
