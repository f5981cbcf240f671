//! Flag sets derived from package contents.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Facts derived from the entry names of an APK archive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ArchiveEntryFlags: u32 {
        const LIB_ARM32 = 1 << 0;
        const LIB_ARM64 = 1 << 1;
        const LIB_X86 = 1 << 2;
        const LIB_X64 = 1 << 3;
        const LIB_FLUTTER = 1 << 4;
        const LIB_REACT_NATIVE = 1 << 5;
        const LIB_XAMARIN = 1 << 6;
        const LIB_MAUI = 1 << 7;
        const KOTLIN = 1 << 8;
        /// Native code present, and every 32-bit ABI has its 64-bit sibling
        const NATIVE_LIBS_64B = 1 << 9;

        const NATIVE_ABIS = Self::LIB_ARM32.bits() | Self::LIB_ARM64.bits() | Self::LIB_X86.bits() | Self::LIB_X64.bits();
    }
}

impl ArchiveEntryFlags {
    /// Scan archive entry names such as `lib/arm64-v8a/libflutter.so`.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::empty();
        for entry in entries {
            let entry = entry.as_ref();
            if entry.starts_with("kotlin/") || entry.ends_with(".kotlin_module") {
                flags |= Self::KOTLIN;
                continue;
            }
            let Some(rest) = entry.strip_prefix("lib/") else { continue };
            let Some((abi, file)) = rest.split_once('/') else { continue };
            flags |= match abi {
                "armeabi" | "armeabi-v7a" => Self::LIB_ARM32,
                "arm64-v8a" => Self::LIB_ARM64,
                "x86" => Self::LIB_X86,
                "x86_64" => Self::LIB_X64,
                _ => Self::empty(),
            };
            flags |= match file {
                "libflutter.so" => Self::LIB_FLUTTER,
                "libreactnativejni.so" | "libreactnative.so" => Self::LIB_REACT_NATIVE,
                "libxamarin-app.so" | "libmonodroid.so" => Self::LIB_XAMARIN,
                "libaot-Microsoft.Maui.dll.so" => Self::LIB_MAUI,
                _ => Self::empty(),
            };
        }
        let arm_ok = !flags.contains(Self::LIB_ARM32) || flags.contains(Self::LIB_ARM64);
        let x86_ok = !flags.contains(Self::LIB_X86) || flags.contains(Self::LIB_X64);
        if flags.intersects(Self::NATIVE_ABIS) && arm_ok && x86_ok {
            flags |= Self::NATIVE_LIBS_64B;
        }
        flags
    }
}

bitflags::bitflags! {
    /// Facts derived from the Java/Kotlin packages found in DEX files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DexPackageFlags: u32 {
        const KOTLIN = 1 << 0;
        const JETPACK_COMPOSE = 1 << 1;
        const COMPOSE_MULTIPLATFORM = 1 << 2;
        const CORDOVA = 1 << 3;
        const MAUI = 1 << 4;
    }
}

const DEX_PREFIXES: &[(&str, DexPackageFlags)] = &[
    ("kotlin", DexPackageFlags::KOTLIN),
    ("androidx.compose", DexPackageFlags::JETPACK_COMPOSE),
    ("org.jetbrains.compose", DexPackageFlags::COMPOSE_MULTIPLATFORM),
    ("org.apache.cordova", DexPackageFlags::CORDOVA),
    ("microsoft.maui", DexPackageFlags::MAUI),
];

impl DexPackageFlags {
    /// Match package names against known prefixes, on segment boundaries.
    pub fn from_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::empty();
        for package in packages {
            let package = package.as_ref().to_ascii_lowercase();
            for (prefix, flag) in DEX_PREFIXES {
                let matches = package == *prefix
                    || package.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('.'));
                if matches {
                    flags |= *flag;
                }
            }
        }
        flags
    }
}
