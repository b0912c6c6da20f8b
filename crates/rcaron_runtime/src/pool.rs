//! Motor pool for concurrent sub-execution.
//!
//! A motor is never shared: each caller gets an exclusive instance and the
//! guard hands it back, reset, when dropped.
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::Motor;

struct PoolSlot {
    /// `None` while handed out.
    motor: Option<Motor>,
    in_use: bool,
}

pub struct MotorPool {
    slots: Mutex<Vec<PoolSlot>>,
    factory: Box<dyn Fn() -> Motor + Send + Sync>,
}

impl MotorPool {
    /// Pool creating new motors with `factory` on demand.
    pub fn new(factory: impl Fn() -> Motor + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(Vec::new()),
            factory: Box::new(factory),
        })
    }

    pub fn acquire(self: &Arc<Self>) -> PooledMotor {
        let index = {
            let mut slots = self.slots.lock();
            if let Some(index) = slots.iter().position(|s| !s.in_use && s.motor.is_some()) {
                let slot = &mut slots[index];
                slot.in_use = true;
                if let Some(motor) = slot.motor.take() {
                    trace!(index, "reusing pooled motor");
                    return PooledMotor {
                        pool: self.clone(),
                        index,
                        motor: Some(motor),
                    };
                }
            }
            slots.push(PoolSlot {
                motor: None,
                in_use: true,
            });
            slots.len() - 1
        };
        trace!(index, "created pooled motor");
        PooledMotor {
            pool: self.clone(),
            index,
            motor: Some((self.factory)()),
        }
    }

    /// Motors created so far.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Motors ready to be handed out.
    pub fn available(&self) -> usize {
        self.slots.lock().iter().filter(|s| !s.in_use).count()
    }

    fn release(&self, index: usize, mut motor: Motor) {
        motor.reset();
        if let Some(slot) = self.slots.lock().get_mut(index) {
            slot.motor = Some(motor);
            slot.in_use = false;
        }
    }
}

/// Exclusive handle on a pooled [`Motor`].
pub struct PooledMotor {
    pool: Arc<MotorPool>,
    index: usize,
    /// Taken only by `drop`.
    motor: Option<Motor>,
}

impl PooledMotor {
    /// Position of this motor in its pool.
    pub fn slot(&self) -> usize {
        self.index
    }
}

impl Deref for PooledMotor {
    type Target = Motor;

    fn deref(&self) -> &Motor {
        self.motor.as_ref().expect("pooled motor should be present until drop")
    }
}

impl DerefMut for PooledMotor {
    fn deref_mut(&mut self) -> &mut Motor {
        self.motor.as_mut().expect("pooled motor should be present until drop")
    }
}

impl Drop for PooledMotor {
    fn drop(&mut self) {
        if let Some(motor) = self.motor.take() {
            self.pool.release(self.index, motor);
        }
    }
}
