//! Shared constants for test infrastructure

pub const OWNER: &str = "acme";
pub const PROJECT: &str = "tool";
pub const SOURCE: &str = "github.com/acme/tool";

pub const TAG_V1_1_0: &str = "v1.1.0";
pub const TAG_V1_2_0: &str = "v1.2.0";
pub const TAG_V2_0_0_RC1: &str = "v2.0.0-rc.1";

pub const LINUX_AMD64_ASSET: &str = "tool_linux_amd64.tar.gz";
pub const DARWIN_ARM64_ASSET: &str = "tool_darwin_arm64.tar.gz";
pub const CHECKSUMS_ASSET: &str = "checksums.txt";

pub const PLATFORM_LINUX_AMD64: &str = "linux/amd64";

pub const BINARY_V1_1_0: &[u8] = b"#!/bin/sh\necho tool 1.1.0\n";
pub const BINARY_V1_2_0: &[u8] = b"#!/bin/sh\necho tool 1.2.0\n";

pub const WRONG_CHECKSUM: &str = "0000000000000000000000000000000000000000000000000000000000000000";
