//! 모듈 시스템
//!
//! 디스크립터 기반 모듈 등록 및 라이프사이클 관리
//! - `module!` 매크로로 모듈 선언 (메타데이터 + init/exit 훅)
//! - 레지스트리 등록 후 load/unload
//! - 참조 카운트 및 안전한 unload 프로토콜

pub mod registry;

pub use registry::{
    ModuleDescriptor, ModuleError, ModuleInfo, ModuleRef, ModuleRegistry, ModuleState,
};

/// 모듈 선언 매크로
///
/// 모듈 크레이트는 이 매크로로 메타데이터와 init/exit 훅을 묶은 정적
/// 디스크립터 `MODULE`을 선언한다. 호스트는 이 디스크립터를
/// [`ModuleRegistry::register`]에 넘긴 뒤 이름으로 load/unload 한다.
///
/// ```ignore
/// kmods::module! {
///     name: "example_driver",
///     version: "0.1.0",
///     license: "GPL",
///     author: "...",
///     description: "...",
///     init: module_init,
///     exit: module_exit,
/// }
/// ```
#[macro_export]
macro_rules! module {
    (
        name: $name:expr,
        version: $version:expr,
        license: $license:expr,
        author: $author:expr,
        description: $description:expr,
        init: $init:path,
        exit: $exit:path $(,)?
    ) => {
        /// 호스트 레지스트리가 소비하는 모듈 디스크립터
        pub static MODULE: $crate::module::ModuleDescriptor = $crate::module::ModuleDescriptor {
            name: $name,
            version: $version,
            license: $license,
            author: $author,
            description: $description,
            init: $init,
            exit: $exit,
        };
    };
}
