// ============ GC Header ============
//
// The header is collector state: the core never interprets it beyond
// handing it to the collector. It sits in the pool's `Gc<T>` wrapper, so
// table/userdata/function payloads stay free of collector bookkeeping.

// Object ages (generational mode)
pub const G_NEW: u8 = 0; // Created in current cycle
pub const G_SURVIVAL: u8 = 1; // Survived one minor collection
pub const G_OLD0: u8 = 2; // Marked old by forward barrier
pub const G_OLD1: u8 = 3; // First full cycle as old
pub const G_OLD: u8 = 4; // Really old object
pub const G_TOUCHED1: u8 = 5; // Old object touched this cycle
pub const G_TOUCHED2: u8 = 6; // Old object touched in previous cycle

// Color bit positions in marked field
pub const WHITE0BIT: u8 = 3;
pub const WHITE1BIT: u8 = 4;
pub const BLACKBIT: u8 = 5;
pub const FIXEDBIT: u8 = 6;

pub const WHITEBITS: u8 = (1 << WHITE0BIT) | (1 << WHITE1BIT);
pub const AGEBITS: u8 = 0x07;
pub const MASKCOLORS: u8 = (1 << BLACKBIT) | WHITEBITS;

/// GC object header
///
/// Bit layout of `marked`:
/// - Bits 0-2: age
/// - Bits 3-4: white (two whites, flipped per cycle)
/// - Bit 5: black
/// - Bit 6: fixed (never collected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcHeader {
    pub marked: u8,
    pub size: u32,
}

impl GcHeader {
    /// New objects are white with age G_NEW
    #[inline(always)]
    pub fn with_white(current_white: u8, size: u32) -> Self {
        debug_assert!(current_white <= 1, "current_white must be 0 or 1");
        GcHeader {
            marked: (1 << (WHITE0BIT + current_white)) | G_NEW,
            size,
        }
    }

    #[inline(always)]
    pub fn age(&self) -> u8 {
        self.marked & AGEBITS
    }

    #[inline(always)]
    pub fn set_age(&mut self, age: u8) {
        debug_assert!(age <= G_TOUCHED2, "Invalid age value");
        self.marked = (self.marked & !AGEBITS) | (age & AGEBITS);
    }

    /// age > G_SURVIVAL
    #[inline(always)]
    pub fn is_old(&self) -> bool {
        self.age() > G_SURVIVAL
    }

    #[inline(always)]
    pub fn is_white(&self) -> bool {
        (self.marked & WHITEBITS) != 0
    }

    #[inline(always)]
    pub fn is_black(&self) -> bool {
        (self.marked & (1 << BLACKBIT)) != 0
    }

    #[inline(always)]
    pub fn make_black(&mut self) {
        self.marked = (self.marked & !WHITEBITS) | (1 << BLACKBIT);
    }

    /// Clear color bits, keep age
    #[inline(always)]
    pub fn make_gray(&mut self) {
        self.marked &= !MASKCOLORS;
    }

    #[inline(always)]
    pub fn is_fixed(&self) -> bool {
        (self.marked & (1 << FIXEDBIT)) != 0
    }

    /// Objects the VM must keep forever (globals, registry, event names)
    #[inline(always)]
    pub fn set_fixed(&mut self) {
        self.set_age(G_OLD);
        self.marked |= 1 << FIXEDBIT;
    }

    #[inline(always)]
    pub fn is_touched(&self) -> bool {
        matches!(self.age(), G_TOUCHED1 | G_TOUCHED2)
    }
}

/// Arena slot: collector header plus the object payload
pub struct Gc<T> {
    pub header: GcHeader,
    pub data: T,
}

impl<T> Gc<T> {
    #[inline(always)]
    pub fn new(data: T, current_white: u8, size: u32) -> Self {
        Self {
            header: GcHeader::with_white(current_white, size),
            data,
        }
    }
}
