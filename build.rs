//! Build script for payslipmerge.
//!
//! On Windows this embeds an application manifest with `longPathAware=true`
//! so payslip archives with deeply nested paths (>260 chars) remain
//! scannable. On other platforms it does nothing.

fn main() {
    #[cfg(windows)]
    {
        embed_resource::compile("payslipmerge.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=payslipmerge.rc");
        println!("cargo:rerun-if-changed=payslipmerge.manifest");
    }
}
