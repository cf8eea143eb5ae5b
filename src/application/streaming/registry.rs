//! Handler registry: focus mode → answer strategy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::conversation::FocusMode;
use crate::domain::protocol::ProtocolError;
use crate::ports::FocusHandler;

/// Read-only lookup table built once at startup and shared by `Arc`.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<FocusMode, Arc<dyn FocusHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Resolves a wire identifier to its handler.
    ///
    /// # Errors
    ///
    /// `UnknownFocusMode` if the identifier is not a focus mode or no handler
    /// is registered for it.
    pub fn resolve(&self, focus_mode: &str) -> Result<(FocusMode, Arc<dyn FocusHandler>), ProtocolError> {
        let unknown = || ProtocolError::UnknownFocusMode(focus_mode.to_string());
        let mode: FocusMode = focus_mode.parse().map_err(|_| unknown())?;
        let handler = self.handlers.get(&mode).ok_or_else(unknown)?;
        Ok((mode, Arc::clone(handler)))
    }

    pub fn contains(&self, mode: FocusMode) -> bool {
        self.handlers.contains_key(&mode)
    }

    /// Registered modes in declaration order.
    pub fn modes(&self) -> Vec<FocusMode> {
        FocusMode::all()
            .iter()
            .copied()
            .filter(|mode| self.contains(*mode))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("modes", &self.modes())
            .finish()
    }
}

/// Builder for [`HandlerRegistry`].
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<FocusMode, Arc<dyn FocusHandler>>,
}

impl HandlerRegistryBuilder {
    /// Registers a handler, replacing any earlier one for the same mode.
    pub fn register(mut self, mode: FocusMode, handler: Arc<dyn FocusHandler>) -> Self {
        self.handlers.insert(mode, handler);
        self
    }

    /// Registers one handler for several modes.
    pub fn register_all(mut self, modes: &[FocusMode], handler: Arc<dyn FocusHandler>) -> Self {
        for mode in modes {
            self.handlers.insert(*mode, Arc::clone(&handler));
        }
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}
