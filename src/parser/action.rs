//! Action code and category decoding.
//!
//! The 32-bit `action` word packs a category bitmask in the upper 16 bits
//! and an action code in the lower 16 bits. Action codes start at 1
//! (queue) and index into a fixed one-character table.

use serde::{Deserialize, Serialize};

/// One character per kernel action code, starting at code 1
const ACTION_CHARS: &[u8] = b"QMFGSRDCPUTIXBAad";

/// Character recorded for action codes outside the table
pub const UNKNOWN_ACTION: char = '?';

/// Shift that moves the category bitmask down to bit 0
pub const CATEGORY_SHIFT: u32 = 16;

// Category bits (after shifting)
pub const CATEGORY_READ: u32 = 1 << 0;
pub const CATEGORY_WRITE: u32 = 1 << 1;
pub const CATEGORY_NOTIFY: u32 = 1 << 10;

// Action codes with special handling during reconstruction
pub const ACTION_QUEUE: u32 = 1;
pub const ACTION_BACKMERGE: u32 = 2;
pub const ACTION_FRONTMERGE: u32 = 3;
pub const ACTION_ISSUE: u32 = 7;
pub const ACTION_COMPLETE: u32 = 8;

/// Action code held in the low 16 bits
pub fn action_code(action: u32) -> u32 {
    action & 0xffff
}

/// Category bitmask held in the high 16 bits
pub fn category(action: u32) -> u32 {
    action >> CATEGORY_SHIFT
}

/// Single-character mnemonic for an action word
pub fn action_char(action: u32) -> char {
    let code = action_code(action) as usize;
    code.checked_sub(1)
        .and_then(|idx| ACTION_CHARS.get(idx))
        .map(|&b| b as char)
        .unwrap_or(UNKNOWN_ACTION)
}

/// Build an action word from a category bitmask and an action code
pub fn make_action(category: u32, code: u32) -> u32 {
    (category << CATEGORY_SHIFT) | (code & 0xffff)
}

/// Whether the category marks a notification-only record
pub fn is_notify(category: u32) -> bool {
    category & CATEGORY_NOTIFY != 0
}

/// Direction of an I/O as far as the statistics care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    Read,
    Write,
    Other,
}

impl IoKind {
    /// Classify a category bitmask
    pub fn from_category(category: u32) -> Self {
        if category & CATEGORY_READ != 0 {
            Self::Read
        } else if category & CATEGORY_WRITE != 0 {
            Self::Write
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_char_table() {
        assert_eq!(action_char(ACTION_QUEUE), 'Q');
        assert_eq!(action_char(ACTION_BACKMERGE), 'M');
        assert_eq!(action_char(ACTION_FRONTMERGE), 'F');
        assert_eq!(action_char(ACTION_ISSUE), 'D');
        assert_eq!(action_char(ACTION_COMPLETE), 'C');
        assert_eq!(action_char(17), 'd');
    }

    #[test]
    fn test_action_char_out_of_range() {
        assert_eq!(action_char(0), UNKNOWN_ACTION);
        assert_eq!(action_char(18), UNKNOWN_ACTION);
        assert_eq!(action_char(0xffff), UNKNOWN_ACTION);
    }

    #[test]
    fn test_category_ignores_action_bits() {
        let action = make_action(CATEGORY_WRITE, ACTION_COMPLETE);
        assert_eq!(category(action), CATEGORY_WRITE);
        assert_eq!(action_char(action), 'C');
    }

    #[test]
    fn test_io_kind() {
        assert_eq!(IoKind::from_category(CATEGORY_READ), IoKind::Read);
        assert_eq!(IoKind::from_category(CATEGORY_WRITE), IoKind::Write);
        assert_eq!(IoKind::from_category(CATEGORY_NOTIFY), IoKind::Other);
        assert!(is_notify(CATEGORY_NOTIFY | CATEGORY_READ));
    }
}
