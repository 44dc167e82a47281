//! Named control parameters and the control-to-audio hand-off.
//!
//! Four float parameters drive the pipeline. The control timeline writes them
//! through a [`ParamStore`], which clamps every value to its declared range
//! and notifies the listeners registered for exactly that parameter. The
//! audio timeline never touches the listener table: each stage reads a
//! [`ParamReceiver`], a lock-free mailbox the store's listener writes into,
//! at most once per block.
//!
//! ```text
//!  control thread                         audio thread
//!  ──────────────                         ────────────
//!  store.set(Drive, 7.0)
//!    ├─ clamp → canonical cell
//!    └─ listeners[Drive] ──► mailbox ──► receiver.poll() ──► GainStage
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;
use tapesat_core::{ParamDescriptor, ParamScale, ParamUnit};

/// Skew applied to every knob's display curve.
pub const DISPLAY_SKEW: f32 = 0.25;

const SATURATION: ParamDescriptor =
    ParamDescriptor::new("Saturation", ParamUnit::Percent, 0.0, 100.0, 0.0);
const DRIVE: ParamDescriptor = ParamDescriptor::new("Drive", ParamUnit::None, 0.0, 10.0, 1.0);
const MIX: ParamDescriptor = ParamDescriptor::new("Mix", ParamUnit::Percent, 0.0, 100.0, 0.0);
const HISS: ParamDescriptor = ParamDescriptor::new("Hiss", ParamUnit::Percent, 0.0, 100.0, 0.0);

/// Errors from string-addressed parameter access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// The name does not match any parameter.
    #[error("unknown parameter '{0}' (expected one of: Saturation, Drive, Mix, Hiss)")]
    Unknown(String),
}

/// Identifies one of the pipeline's control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    /// Waveshaper input scaling, 0–100 %.
    Saturation,
    /// Pre-gain, 0–10 mapped to 0–12 dB.
    Drive,
    /// Wet proportion, 0–100 %.
    Mix,
    /// Noise level, 0–100 % mapped to -60 to -12 dB.
    Hiss,
}

impl ParamId {
    /// Every parameter, in declaration order.
    pub const ALL: [ParamId; 4] = [
        ParamId::Saturation,
        ParamId::Drive,
        ParamId::Mix,
        ParamId::Hiss,
    ];

    /// Stable name used in notifications and presets.
    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Position in [`ParamId::ALL`].
    pub const fn index(self) -> usize {
        match self {
            ParamId::Saturation => 0,
            ParamId::Drive => 1,
            ParamId::Mix => 2,
            ParamId::Hiss => 3,
        }
    }

    /// Range, default and display metadata.
    pub const fn descriptor(self) -> ParamDescriptor {
        let base = match self {
            ParamId::Saturation => SATURATION,
            ParamId::Drive => DRIVE,
            ParamId::Mix => MIX,
            ParamId::Hiss => HISS,
        };
        base.with_scale(ParamScale::Power(1.0 / DISPLAY_SKEW))
    }

    /// Clamps `value` to this parameter's range.
    pub fn clamp(self, value: f32) -> f32 {
        self.descriptor().clamp(value)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamId {
    type Err = ParamError;

    /// Parses a parameter name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParamError::Unknown(s.to_string()))
    }
}

/// Plain values of all four parameters.
///
/// Construction through [`ParameterSnapshot::set`] keeps every value in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    /// Saturation, 0–100.
    pub saturation: f32,
    /// Drive, 0–10.
    pub drive: f32,
    /// Mix, 0–100.
    pub mix: f32,
    /// Hiss, 0–100.
    pub hiss: f32,
}

impl ParameterSnapshot {
    /// Value of one parameter.
    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Saturation => self.saturation,
            ParamId::Drive => self.drive,
            ParamId::Mix => self.mix,
            ParamId::Hiss => self.hiss,
        }
    }

    /// Sets one parameter, clamped to its range.
    pub fn set(&mut self, id: ParamId, value: f32) {
        let value = id.clamp(value);
        match id {
            ParamId::Saturation => self.saturation = value,
            ParamId::Drive => self.drive = value,
            ParamId::Mix => self.mix = value,
            ParamId::Hiss => self.hiss = value,
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, id: ParamId, value: f32) -> Self {
        self.set(id, value);
        self
    }

    /// Copy with every value clamped to its range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for id in ParamId::ALL {
            out.set(id, self.get(id));
        }
        out
    }

    /// `(id, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        ParamId::ALL.into_iter().map(|id| (id, self.get(id)))
    }
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            saturation: SATURATION.default,
            drive: DRIVE.default,
            mix: MIX.default,
            hiss: HISS.default,
        }
    }
}

/// One atomically published `f32` with a change counter.
#[derive(Debug)]
struct ParamCell {
    bits: AtomicU32,
    version: AtomicU64,
}

impl ParamCell {
    fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
            version: AtomicU64::new(0),
        }
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.version.fetch_add(1, Ordering::Release);
    }
}

/// Audio-side end of a parameter subscription.
///
/// Lock-free and allocation-free: [`poll`](Self::poll) is two atomic loads.
/// Dropping the receiver unregisters its listener from the store.
#[derive(Debug)]
pub struct ParamReceiver {
    id: ParamId,
    cell: Arc<ParamCell>,
    seen: u64,
    registration: Registration,
}

struct Registration {
    handle: ListenerId,
    table: Weak<ListenerTable>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handle", &self.handle)
            .field("live", &(self.table.strong_count() > 0))
            .finish()
    }
}

impl Drop for ParamReceiver {
    fn drop(&mut self) {
        if let Some(table) = self.registration.table.upgrade() {
            unregister(&table, self.registration.handle);
        }
    }
}

impl ParamReceiver {
    /// Parameter this receiver follows.
    pub fn id(&self) -> ParamId {
        self.id
    }

    /// Returns the latest value if it changed since the last poll.
    #[inline]
    pub fn poll(&mut self) -> Option<f32> {
        let version = self.cell.version.load(Ordering::Acquire);
        if version == self.seen {
            return None;
        }
        self.seen = version;
        Some(self.cell.load())
    }

    /// Latest value regardless of change state.
    pub fn value(&self) -> f32 {
        self.cell.load()
    }
}

/// Callback invoked with the clamped value after a parameter changes.
pub type Listener = Arc<dyn Fn(ParamId, f32) + Send + Sync>;

/// Handle returned by [`ParamStore::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerTable = RwLock<HashMap<ParamId, Vec<(ListenerId, Listener)>>>;

fn unregister(table: &ListenerTable, handle: ListenerId) -> bool {
    let mut table = table.write();
    for entries in table.values_mut() {
        if let Some(pos) = entries.iter().position(|(h, _)| *h == handle) {
            entries.remove(pos);
            return true;
        }
    }
    false
}

/// Parameter store with an explicit registration table.
///
/// Values live in atomics so readers on any thread see them without locking.
/// The listener table is only touched by [`set`](Self::set) and
/// (un)registration, all of which belong on the control timeline.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tapesat_effects::{ParamId, ParamStore};
///
/// let store = ParamStore::new();
/// let seen = Arc::new(AtomicU32::new(0));
/// let sink = Arc::clone(&seen);
/// store.add_listener(ParamId::Drive, move |_, v| sink.store(v.to_bits(), Ordering::Relaxed));
///
/// assert_eq!(store.set(ParamId::Drive, 42.0), 10.0);
/// assert_eq!(f32::from_bits(seen.load(Ordering::Relaxed)), 10.0);
/// ```
pub struct ParamStore {
    values: [ParamCell; 4],
    listeners: Arc<ListenerTable>,
    next_listener: AtomicU64,
}

impl ParamStore {
    /// Creates a store holding the default snapshot.
    pub fn new() -> Self {
        Self::with_snapshot(&ParameterSnapshot::default())
    }

    /// Creates a store holding `snapshot` (clamped).
    pub fn with_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let snapshot = snapshot.clamped();
        Self {
            values: ParamId::ALL.map(|id| ParamCell::new(snapshot.get(id))),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Current value of `id`.
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Clamps and stores `value`, then notifies listeners of `id`.
    ///
    /// Returns the value actually stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let value = id.clamp(value);
        self.values[id.index()].store(value);

        // Listeners run outside the lock so they may (un)register.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(&id)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(id, value);
        }
        value
    }

    /// String-addressed [`set`](Self::set).
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32, ParamError> {
        Ok(self.set(name.parse()?, value))
    }

    /// Current values of every parameter.
    pub fn snapshot(&self) -> ParameterSnapshot {
        let mut snapshot = ParameterSnapshot::default();
        for id in ParamId::ALL {
            snapshot.set(id, self.get(id));
        }
        snapshot
    }

    /// Sets every parameter from `snapshot`, notifying as it goes.
    pub fn apply_snapshot(&self, snapshot: &ParameterSnapshot) {
        for (id, value) in snapshot.iter() {
            self.set(id, value);
        }
    }

    /// Registers `listener` for changes of `id` only.
    pub fn add_listener<F>(&self, id: ParamId, listener: F) -> ListenerId
    where
        F: Fn(ParamId, f32) + Send + Sync + 'static,
    {
        let handle = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(id)
            .or_default()
            .push((handle, Arc::new(listener)));
        handle
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, handle: ListenerId) -> bool {
        unregister(&self.listeners, handle)
    }

    /// Number of listeners registered for `id`.
    pub fn listener_count(&self, id: ParamId) -> usize {
        self.listeners.read().get(&id).map_or(0, Vec::len)
    }

    /// Subscribes a lock-free mailbox to `id`.
    ///
    /// The receiver reports the current value on its first poll. Its
    /// listener stays registered until the receiver is dropped.
    pub fn connect(&self, id: ParamId) -> ParamReceiver {
        let cell = Arc::new(ParamCell::new(self.get(id)));
        cell.version.store(1, Ordering::Release);

        let mailbox = Arc::clone(&cell);
        let handle = self.add_listener(id, move |_, value| mailbox.store(value));

        ParamReceiver {
            id,
            cell,
            seen: 0,
            registration: Registration {
                handle,
                table: Arc::downgrade(&self.listeners),
            },
        }
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamStore")
            .field("values", &self.snapshot())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn defaults_follow_layout() {
        let snapshot = ParameterSnapshot::default();
        assert_eq!(snapshot.saturation, 0.0);
        assert_eq!(snapshot.drive, 1.0);
        assert_eq!(snapshot.mix, 0.0);
        assert_eq!(snapshot.hiss, 0.0);
    }

    #[test]
    fn names_round_trip() {
        for id in ParamId::ALL {
            assert_eq!(id.name().parse::<ParamId>(), Ok(id));
        }
        assert_eq!("drive".parse::<ParamId>(), Ok(ParamId::Drive));
        assert!(matches!("Wow".parse::<ParamId>(), Err(ParamError::Unknown(_))));
    }

    #[test]
    fn set_clamps_to_declared_range() {
        let store = ParamStore::new();
        assert_eq!(store.set(ParamId::Drive, -3.0), 0.0);
        assert_eq!(store.set(ParamId::Mix, 250.0), 100.0);
        assert_eq!(store.set(ParamId::Hiss, f32::NAN), 0.0);
        assert_eq!(store.get(ParamId::Mix), 100.0);
    }

    #[test]
    fn listeners_only_hear_their_parameter() {
        let store = ParamStore::new();
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&heard);
        store.add_listener(ParamId::Hiss, move |id, v| sink.lock().unwrap().push((id, v)));

        store.set(ParamId::Drive, 5.0);
        store.set(ParamId::Hiss, 40.0);

        assert_eq!(*heard.lock().unwrap(), vec![(ParamId::Hiss, 40.0)]);
    }

    #[test]
    fn removed_listener_is_silent() {
        let store = ParamStore::new();
        let handle = store.add_listener(ParamId::Mix, |_, _| panic!("should be removed"));
        assert_eq!(store.listener_count(ParamId::Mix), 1);
        assert!(store.remove_listener(handle));
        assert!(!store.remove_listener(handle));
        store.set(ParamId::Mix, 10.0);
    }

    #[test]
    fn receiver_reports_initial_then_changes_only() {
        let store = ParamStore::new();
        store.set(ParamId::Saturation, 30.0);
        let mut rx = store.connect(ParamId::Saturation);

        assert_eq!(rx.poll(), Some(30.0));
        assert_eq!(rx.poll(), None);

        store.set(ParamId::Saturation, 10.0);
        store.set(ParamId::Saturation, 60.0);
        assert_eq!(rx.poll(), Some(60.0));
        assert_eq!(rx.poll(), None);
    }

    #[test]
    fn dropped_receiver_unregisters() {
        let store = ParamStore::new();
        let rx = store.connect(ParamId::Drive);
        let other = store.connect(ParamId::Drive);
        assert_eq!(store.listener_count(ParamId::Drive), 2);

        drop(rx);
        assert_eq!(store.listener_count(ParamId::Drive), 1);
        store.set(ParamId::Drive, 4.0);
        assert_eq!(other.value(), 4.0);
    }

    #[test]
    fn receiver_outlives_store() {
        let store = ParamStore::new();
        let mut rx = store.connect(ParamId::Hiss);
        drop(store);
        assert_eq!(rx.poll(), Some(0.0));
        drop(rx);
    }

    #[test]
    fn snapshot_round_trip() {
        let store = ParamStore::new();
        let snapshot = ParameterSnapshot::default()
            .with(ParamId::Saturation, 55.0)
            .with(ParamId::Hiss, 12.0);
        store.apply_snapshot(&snapshot);
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn set_by_name_rejects_unknown() {
        let store = ParamStore::new();
        assert_eq!(store.set_by_name("Mix", 20.0), Ok(20.0));
        assert!(store.set_by_name("Flutter", 1.0).is_err());
    }

    #[test]
    fn descriptors_use_display_skew() {
        for id in ParamId::ALL {
            assert_eq!(id.descriptor().scale, ParamScale::Power(4.0));
        }
    }
}
