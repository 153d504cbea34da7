// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! position_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(usize);

        impl $name {
            pub const fn new(value: usize) -> Self {
                Self(value)
            }

            pub const fn get(self) -> usize {
                self.0
            }
        }
    };
}

position_id!(EntryId);
position_id!(SubjectId);

/// Identity of one (language, event, subject) triple by its position in the
/// loaded dataset. Stable across filter changes because the dataset never
/// mutates after load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId {
    pub entry: EntryId,
    pub subject: SubjectId,
}

impl RowId {
    pub const fn new(entry: usize, subject: usize) -> Self {
        Self {
            entry: EntryId::new(entry),
            subject: SubjectId::new(subject),
        }
    }
}
