//! Build script for imgdedup.
//!
//! On Windows this embeds the application manifest so scans of deeply
//! nested photo libraries are not cut off at the 260-character MAX_PATH
//! limit. The manifest (`imgdedup.manifest`) sets `longPathAware=true`,
//! which together with the Windows 10 v1607+ registry setting raises the
//! limit to 32,767 characters. Other platforms need nothing from this
//! script.

fn main() {
    #[cfg(windows)]
    {
        // The .rc file embeds the XML manifest as an RT_MANIFEST resource
        embed_resource::compile("imgdedup.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=imgdedup.rc");
        println!("cargo:rerun-if-changed=imgdedup.manifest");
    }
}
