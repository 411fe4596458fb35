// Small value types passed across the ring's API

/// Whether a publish should wake consumers blocked in `wait`.
///
/// `Silent` skips the wake syscall for producers that know nobody is waiting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Notify {
    #[default]
    Wake,
    Silent,
}

impl Notify {
    #[inline]
    pub fn wakes(self) -> bool {
        matches!(self, Notify::Wake)
    }
}

impl From<bool> for Notify {
    fn from(notify: bool) -> Self {
        if notify {
            Notify::Wake
        } else {
            Notify::Silent
        }
    }
}
