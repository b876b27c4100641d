//! Tagged dispatch over linked resources
//!
//! A [`Link`](payrun_domain::Link) names the kind of resource it points at in
//! its `TargetType`. Callers walking heterogeneous links declare the kinds
//! they handle as a closed enum with [`linked_resource!`](crate::linked_resource)
//! and fetch through [`ApiClient::get_linked`](super::ApiClient::get_linked).

use payrun_common::{Codec, Element};
use payrun_domain::PayRunError;

/// Closed set of typed resources selectable by type tag.
pub trait LinkedResource: Sized {
    /// Tags accepted by [`LinkedResource::from_document`].
    fn target_types() -> &'static [&'static str];

    /// Tag of this value's variant.
    fn target_type(&self) -> &'static str;

    /// Map `document` onto the variant registered for `target_type`.
    ///
    /// # Errors
    /// Returns `PayRunError::MalformedDocument` for an unknown tag or a
    /// document that does not fit the variant's type.
    fn from_document(
        codec: &Codec,
        target_type: &str,
        document: &Element,
    ) -> Result<Self, PayRunError>;
}

/// Generates an enum over typed resources and its [`LinkedResource`] impl.
///
/// # Example
///
/// ```rust,ignore
/// use payrun_infra::linked_resource;
///
/// linked_resource! {
///     #[derive(Debug)]
///     pub enum PayInstruction {
///         Salary(SalaryPayInstruction) => "SalaryPayInstruction",
///         Tax(TaxPayInstruction) => "TaxPayInstruction",
///     }
/// }
///
/// for link in client.get_links("/Employer/ER001/Employee/EE001/PayInstructions")?.iter() {
///     match client.get_linked::<PayInstruction>(link)? {
///         PayInstruction::Salary(salary) => { /* ... */ }
///         PayInstruction::Tax(tax) => { /* ... */ }
///     }
/// }
/// ```
#[macro_export]
macro_rules! linked_resource {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident($ty:ty) => $tag:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant($ty),)+
        }

        impl $crate::api::LinkedResource for $name {
            fn target_types() -> &'static [&'static str] {
                &[$($tag),+]
            }

            fn target_type(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $tag,)+
                }
            }

            fn from_document(
                codec: &$crate::__private::Codec,
                target_type: &str,
                document: &$crate::__private::Element,
            ) -> ::std::result::Result<Self, $crate::__private::PayRunError> {
                match target_type {
                    $($tag => codec
                        .from_element::<$ty>(document)
                        .map(Self::$variant)
                        .map_err($crate::errors::IntoPayRunError::into_payrun),)+
                    other => Err($crate::__private::PayRunError::MalformedDocument(format!(
                        "unknown target type '{}' for {}",
                        other,
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}
