//! Definitions related to the variable services.

use bitflags::bitflags;

use crate::{data_type::Guid, guid};

/// The vendor [`Guid`] under which architecturally defined variables are stored.
pub const GLOBAL_VARIABLE: Guid = guid!("8be4df61-93ca-11d2-aa0d-00e098032b8c");

bitflags! {
    /// Various attributes that define how the variable is stored and when it can be accessed.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct VariableAttributes: u32 {
        /// The variable should be stored in a non-volatile manner.
        const NON_VOLATILE = 0x00000001;
        /// The variable should be queryable during boot services.
        const BOOT_SERVICES_ACCESS = 0x00000002;
        /// The variable should be queryable during runtime.
        const RUNTIME_ACCESS = 0x00000004;
        /// The variable is a hardware error record.
        const HARDWARE_ERROR_RECORD = 0x00000008;
        /// The variable is authenticated with a monotonic count.
        const AUTHENTICATED_WRITE_ACCESS = 0x00000010;
        /// Indicates that the variable is authenticated and the variable may only be updated
        /// with a higher time than the signed variable was created with.
        const TIME_BASED_AUTHENTICATED_WRITE_ACCESS = 0x00000020;
        /// Indicates that the set operation should append instead of overwriting.
        const APPEND_WRITE = 0x00000040;
        /// The variable uses the enhanced authentication format.
        const ENHANCED_AUTHENTICATED_ACCESS = 0x00000080;
    }
}

impl VariableAttributes {
    /// Both access attributes.
    pub const ACCESS: Self = Self::BOOT_SERVICES_ACCESS.union(Self::RUNTIME_ACCESS);

    /// Attributes describing where and when the variable is stored and visible.
    pub const STORAGE: Self = Self::NON_VOLATILE
        .union(Self::ACCESS)
        .union(Self::HARDWARE_ERROR_RECORD);

    /// Attributes requesting an authenticated or appending write.
    pub const AUTHENTICATED: Self = Self::AUTHENTICATED_WRITE_ACCESS
        .union(Self::TIME_BASED_AUTHENTICATED_WRITE_ACCESS)
        .union(Self::ENHANCED_AUTHENTICATED_ACCESS);

    /// Returns `true` if the runtime access attribute is set without boot services access.
    pub const fn runtime_without_boot_access(self) -> bool {
        self.intersection(Self::ACCESS).bits() == Self::RUNTIME_ACCESS.bits()
    }
}
