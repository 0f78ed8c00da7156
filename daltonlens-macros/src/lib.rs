use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

// Debug builds only carry the baselines, keeps compile times sane
#[cfg(debug_assertions)]
const TARGETS: &[&str] = &["x86_64+sse2", "aarch64+neon"];

#[cfg(not(debug_assertions))]
const TARGETS: &[&str] = &[
    // 3x3 matrix kernels mostly profit from fma
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl",
    "x86_64+avx2+fma",
    "x86_64+sse4.2",
    "x86_64+sse2",
    "aarch64+neon+sve",
    "aarch64+neon",
];

/// Multiversions a per-row pixel kernel over the CPU targets daltonlens ships for.
///
/// The annotated crate must depend on `multiversion` itself, the expansion
/// refers to `multiversion::multiversion`.
///
/// ```ignore
/// use daltonlens_macros::simd_targets;
///
/// #[simd_targets]
/// fn scale_row(row: &mut [f32], factor: f32) {
///     row.iter_mut().for_each(|v| *v *= factor);
/// }
/// ```
#[proc_macro_attribute]
pub fn simd_targets(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let kernel = parse_macro_input!(input as ItemFn);
    let targets = TARGETS.iter();

    TokenStream::from(quote! {
        #[multiversion::multiversion(targets(#(#targets),*))]
        #kernel
    })
}
