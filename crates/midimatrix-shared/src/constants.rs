/// Default database file name inside the data directory
pub const DB_FILE_NAME: &str = "midimatrix.db";

/// Maximum length of a profile badger, in characters
pub const BADGER_MAX_CHARS: usize = 30;

/// Maximum length of a matrix name, in characters
pub const MATRIX_NAME_MAX_CHARS: usize = 250;
