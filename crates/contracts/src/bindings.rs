//! Constructor ABIs of the contracts this workspace deploys.

#[macro_export]
macro_rules! bindings {
    ($contract:ident { $($body:tt)* }) => {
        paste::paste! {
            // Generate the main bindings in a private module. That allows
            // us to re-export all items in our own module while also adding
            // some items ourselves.
            #[allow(non_snake_case)]
            mod [<$contract Private>] {
                alloy::sol! {
                    #[allow(missing_docs)]
                    contract $contract {
                        $($body)*
                    }
                }
            }

            #[allow(non_snake_case)]
            pub mod $contract {
                pub use super::[<$contract Private>]::*;

                /// Name of the contract in the build directory.
                pub const NAME: &str = stringify!($contract);
            }
        }
    };
}

crate::bindings!(FundMe {
    constructor(address _priceFeed);
});

crate::bindings!(MockV3Aggregator {
    constructor(uint8 _decimals, int256 _initialAnswer);
});
