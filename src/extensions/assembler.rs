//! Configure/build argument assembly
//!
//! Pure and total: no I/O, no subprocesses, and the same inputs always give
//! the same arguments in the same order. Configure arguments are laid out as
//!
//! 1. library output directory (always first)
//! 2. interpreter executable
//! 3. platform configure flags, in policy order
//! 4. interpreter include and library directories
//! 5. pass-through defines, one token each, always last

use super::types::{BuildConfiguration, BuildProfile, Define, ExtensionTarget};
use crate::platform::PlatformFlags;
use crate::runtime::RuntimeInfo;
use std::path::{Path, PathBuf};

/// Turns probe results and options into a [`BuildConfiguration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigAssembler {
    /// Root the packaging step collects built libraries from
    build_lib: PathBuf,
}

impl ConfigAssembler {
    pub fn new(build_lib: impl Into<PathBuf>) -> Self {
        Self {
            build_lib: build_lib.into(),
        }
    }

    #[must_use]
    pub fn build_lib(&self) -> &Path {
        &self.build_lib
    }

    #[must_use]
    pub fn assemble(
        &self,
        target: &ExtensionTarget,
        profile: BuildProfile,
        runtime: &RuntimeInfo,
        platform: &PlatformFlags,
        defines: &[Define],
    ) -> BuildConfiguration {
        let artifact_dir = target.artifact_dir(&self.build_lib);

        let mut configure_args = vec![
            format!("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}", artifact_dir.display()),
            format!("-DPYTHON_EXECUTABLE={}", runtime.executable.display()),
        ];
        configure_args.extend(
            platform
                .configure
                .iter()
                .flat_map(|flag| flag.render(&artifact_dir)),
        );
        configure_args.push(format!(
            "-DPYTHON_INCLUDE_DIR={}",
            runtime.include_dir.display()
        ));
        configure_args.push(format!("-DPYTHON_LIBRARY={}", runtime.lib_dir.display()));
        configure_args.extend(defines.iter().map(Define::to_arg));

        let mut build_args = vec!["--config".to_string(), profile.as_str().to_string()];
        if !platform.native_build.is_empty() {
            build_args.push("--".to_string());
            build_args.extend(platform.native_build.iter().map(ToString::to_string));
        }

        BuildConfiguration {
            profile,
            configure_args,
            build_args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::cmake_extension::ToolVersion;
    use crate::platform::{OsFamily, PlatformPolicy, PointerWidth};

    fn runtime() -> RuntimeInfo {
        RuntimeInfo {
            executable: PathBuf::from("/usr/bin/python3"),
            include_dir: PathBuf::from("/usr/include/python3.12"),
            lib_dir: PathBuf::from("/usr/lib"),
            ext_suffix: ".so".to_string(),
        }
    }

    fn flags(os: OsFamily, profile: BuildProfile) -> PlatformFlags {
        PlatformPolicy::new(os, PointerWidth::Bits64)
            .flags_for(&ToolVersion::from_output("cmake version 3.20.0"), profile)
            .unwrap()
    }

    fn defines() -> Vec<Define> {
        vec![
            Define::new("OpenCV_DIR", "/opt/opencv/lib/cmake"),
            Define::new("OpenCV_FOUND", "1"),
        ]
    }

    #[test]
    fn unix_release_order() {
        let assembler = ConfigAssembler::new("/out/lib");
        let target = ExtensionTarget::new("demo", "/src/demo").unwrap();
        let config = assembler.assemble(
            &target,
            BuildProfile::Release,
            &runtime(),
            &flags(OsFamily::Unix, BuildProfile::Release),
            &defines(),
        );

        assert_eq!(
            config.configure_args(),
            [
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY=/out/lib",
                "-DPYTHON_EXECUTABLE=/usr/bin/python3",
                "-DCMAKE_BUILD_TYPE=Release",
                "-DPYTHON_INCLUDE_DIR=/usr/include/python3.12",
                "-DPYTHON_LIBRARY=/usr/lib",
                "-DOpenCV_DIR=/opt/opencv/lib/cmake",
                "-DOpenCV_FOUND=1",
            ]
        );
        assert_eq!(config.build_args(), ["--config", "Release", "--", "-j2"]);
        assert_eq!(config.profile(), BuildProfile::Release);
    }

    #[test]
    fn windows_debug_order() {
        let assembler = ConfigAssembler::new("/out/lib");
        let target = ExtensionTarget::new("pkg.native", "/src/demo").unwrap();
        let config = assembler.assemble(
            &target,
            BuildProfile::Debug,
            &runtime(),
            &flags(OsFamily::Windows, BuildProfile::Debug),
            &[],
        );

        assert_eq!(
            config.configure_args(),
            [
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY=/out/lib/pkg",
                "-DPYTHON_EXECUTABLE=/usr/bin/python3",
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_DEBUG=/out/lib/pkg",
                "-A",
                "x64",
                "-DPYTHON_INCLUDE_DIR=/usr/include/python3.12",
                "-DPYTHON_LIBRARY=/usr/lib",
            ]
        );
        assert_eq!(config.build_args(), ["--config", "Debug", "--", "/m"]);
    }

    #[test]
    fn output_directory_always_first() {
        let assembler = ConfigAssembler::new("/out/lib");
        for os in [OsFamily::Unix, OsFamily::Windows] {
            for profile in [BuildProfile::Debug, BuildProfile::Release] {
                for name in ["demo", "pkg.sub.demo"] {
                    let target = ExtensionTarget::new(name, "/src").unwrap();
                    let config = assembler.assemble(
                        &target,
                        profile,
                        &runtime(),
                        &flags(os, profile),
                        &defines(),
                    );
                    let first = config.configure_args().first().unwrap();
                    assert!(first.starts_with("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY="));
                }
            }
        }
    }

    #[test]
    fn profile_agrees_between_steps() {
        let assembler = ConfigAssembler::new("/out/lib");
        let target = ExtensionTarget::new("demo", "/src").unwrap();
        for profile in [BuildProfile::Debug, BuildProfile::Release] {
            let config = assembler.assemble(
                &target,
                profile,
                &runtime(),
                &flags(OsFamily::Unix, profile),
                &[],
            );
            let build_type = format!("-DCMAKE_BUILD_TYPE={profile}");
            assert!(config.configure_args().contains(&build_type));
            assert_eq!(config.build_args().get(1), Some(&profile.to_string()));
        }
    }

    #[test]
    fn assembly_is_deterministic() {
        let assembler = ConfigAssembler::new("/out/lib");
        let target = ExtensionTarget::new("demo", "/src").unwrap();
        let platform = flags(OsFamily::Unix, BuildProfile::Release);

        let first = assembler.assemble(
            &target,
            BuildProfile::Release,
            &runtime(),
            &platform,
            &defines(),
        );
        let second = assembler.assemble(
            &target,
            BuildProfile::Release,
            &runtime(),
            &platform,
            &defines(),
        );

        assert_eq!(first, second);
    }

    #[test]
    fn define_values_stay_single_tokens() {
        let assembler = ConfigAssembler::new("/out/lib");
        let target = ExtensionTarget::new("demo", "/src").unwrap();
        let libs = Define::new("OpenCV_LIBS", "opencv_core opencv_imgproc");
        let config = assembler.assemble(
            &target,
            BuildProfile::Release,
            &runtime(),
            &flags(OsFamily::Unix, BuildProfile::Release),
            std::slice::from_ref(&libs),
        );

        assert_eq!(
            config.configure_args().last(),
            Some(&"-DOpenCV_LIBS=opencv_core opencv_imgproc".to_string())
        );
    }
}
