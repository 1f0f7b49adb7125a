//! 모듈 레지스트리
//!
//! 선언된 모듈 테이블과 로드된 모듈의 라이프사이클 관리
//! - 디스크립터 등록 (이름 → 디스크립터)
//! - load: init 훅 호출 후 Live 전환 (라이프사이클당 정확히 1회)
//! - unload: 참조 카운트 확인 후 exit 훅 호출
//! - ModuleRef RAII 가드로 언로드 차단

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use spin::RwLock;

use crate::kprintln;

/// 모듈 디스크립터
///
/// `module!` 매크로가 생성하는 정적 선언. 메타데이터는 불변 정적 데이터이며
/// init/exit 훅은 호스트가 load/unload 시 호출한다.
#[derive(Debug)]
pub struct ModuleDescriptor {
    /// 모듈 이름 (레지스트리 키)
    pub name: &'static str,
    /// 버전
    pub version: &'static str,
    /// 라이선스 식별자
    pub license: &'static str,
    /// 저자
    pub author: &'static str,
    /// 한 줄 설명
    pub description: &'static str,
    /// 초기화 훅 — 0 반환 시 성공
    pub init: extern "C" fn() -> i32,
    /// 정리 훅 — 실패하거나 언로드를 거부할 수 없다
    pub exit: extern "C" fn(),
}

/// 모듈 에러
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleError {
    /// 같은 이름의 디스크립터가 이미 등록됨
    AlreadyRegistered,
    /// 이미 로드됨
    AlreadyLoaded,
    /// 모듈을 찾을 수 없음
    NotFound,
    /// 초기화 함수 실패 (0이 아닌 반환값)
    InitFailed(i32),
    /// 모듈이 사용 중
    InUse,
    /// 모듈이 언로딩 중
    ModuleUnloading,
}

/// 모듈 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// 로딩 중 (init 훅 실행 전)
    Loading,
    /// 활성 상태
    Live,
    /// 언로딩 중
    Unloading,
}

/// 모듈 상세 정보 (조회용)
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub license: String,
    pub state: ModuleState,
    pub ref_count: usize,
    pub is_unloading: bool,
}

/// 로드된 모듈
struct LoadedModule {
    descriptor: &'static ModuleDescriptor,
    state: ModuleState,
    ref_count: AtomicUsize,
    /// 언로딩 중 플래그 (새 참조 획득 차단)
    unloading: AtomicBool,
}

impl LoadedModule {
    fn new(descriptor: &'static ModuleDescriptor) -> Self {
        Self {
            descriptor,
            state: ModuleState::Loading,
            ref_count: AtomicUsize::new(0),
            unloading: AtomicBool::new(false),
        }
    }

    fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// 초기화 훅 호출 — 성공 시 Live 전환
    fn init(&mut self) -> Result<(), ModuleError> {
        let result = (self.descriptor.init)();
        if result != 0 {
            return Err(ModuleError::InitFailed(result));
        }
        self.state = ModuleState::Live;
        Ok(())
    }

    /// 정리 훅 호출
    fn exit(&mut self) {
        self.state = ModuleState::Unloading;
        (self.descriptor.exit)();
    }

    /// 안전한 참조 획득 (언로딩 중이면 None 반환)
    fn try_get(&self) -> Option<usize> {
        if self.unloading.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.ref_count.fetch_add(1, Ordering::SeqCst))
    }

    /// 참조 카운트 감소
    fn put(&self) -> usize {
        self.ref_count.fetch_sub(1, Ordering::SeqCst)
    }
}

/// 모듈 참조 가드 (RAII)
///
/// Drop 시 자동으로 참조 카운트 감소. 가드가 살아있는 동안 해당 모듈의
/// unload는 `InUse`로 실패한다.
pub struct ModuleRef {
    module_name: String,
}

impl ModuleRef {
    /// 모듈 이름 반환
    pub fn name(&self) -> &str {
        &self.module_name
    }
}

impl Drop for ModuleRef {
    fn drop(&mut self) {
        let modules = LOADED_MODULES.read();
        if let Some(module) = modules.iter().find(|m| m.name() == self.module_name) {
            module.put();
        }
    }
}

/// 등록된 모듈 디스크립터 테이블
static REGISTERED: RwLock<Vec<&'static ModuleDescriptor>> = RwLock::new(Vec::new());

/// 로드된 모듈 목록
static LOADED_MODULES: RwLock<Vec<Box<LoadedModule>>> = RwLock::new(Vec::new());

/// 모듈 레지스트리
pub struct ModuleRegistry;

impl ModuleRegistry {
    /// 디스크립터 등록
    pub fn register(descriptor: &'static ModuleDescriptor) -> Result<(), ModuleError> {
        let mut registered = REGISTERED.write();
        if registered.iter().any(|d| d.name == descriptor.name) {
            return Err(ModuleError::AlreadyRegistered);
        }
        registered.push(descriptor);
        kprintln!(
            "[module] Registered module '{}' v{}",
            descriptor.name,
            descriptor.version
        );
        Ok(())
    }

    /// 모듈 로드
    ///
    /// 디스크립터를 이름으로 찾아 init 훅을 호출하고 로드 목록에 추가한다.
    /// init이 0이 아닌 값을 반환하면 모듈은 로드되지 않는다.
    pub fn load(name: &str) -> Result<(), ModuleError> {
        let descriptor = {
            let registered = REGISTERED.read();
            registered
                .iter()
                .find(|d| d.name == name)
                .copied()
                .ok_or(ModuleError::NotFound)?
        };

        if Self::is_loaded(name) {
            return Err(ModuleError::AlreadyLoaded);
        }

        kprintln!("[module] Loading module: {}", name);

        let mut module = Box::new(LoadedModule::new(descriptor));
        module.init()?;

        LOADED_MODULES.write().push(module);

        kprintln!("[module] Module '{}' loaded successfully", name);
        Ok(())
    }

    /// 모듈 언로드
    ///
    /// 안전한 unload 프로토콜:
    /// 1. unloading 플래그 설정 (새 참조 획득 차단)
    /// 2. 참조 카운트 확인 — 0이 아니면 즉시 실패, 플래그 롤백
    /// 3. exit 훅 호출 후 목록에서 제거
    pub fn unload(name: &str) -> Result<(), ModuleError> {
        {
            let modules = LOADED_MODULES.read();
            let module = modules
                .iter()
                .find(|m| m.name() == name)
                .ok_or(ModuleError::NotFound)?;

            // 이미 언로딩 중인지 확인
            if module.unloading.swap(true, Ordering::SeqCst) {
                return Err(ModuleError::ModuleUnloading);
            }

            if module.ref_count.load(Ordering::SeqCst) > 0 {
                // 플래그 롤백
                module.unloading.store(false, Ordering::SeqCst);
                return Err(ModuleError::InUse);
            }
        }

        let mut modules = LOADED_MODULES.write();
        let idx = modules
            .iter()
            .position(|m| m.name() == name)
            .ok_or(ModuleError::NotFound)?;

        modules[idx].exit();
        modules.remove(idx);

        kprintln!("[module] Module '{}' unloaded", name);
        Ok(())
    }

    /// 모듈 참조 획득 (RAII 가드 반환)
    ///
    /// 모듈이 로드되어 있고 언로딩 중이 아니면 참조를 획득한다.
    pub fn acquire(name: &str) -> Result<ModuleRef, ModuleError> {
        let modules = LOADED_MODULES.read();
        let module = modules
            .iter()
            .find(|m| m.name() == name)
            .ok_or(ModuleError::NotFound)?;

        if module.try_get().is_none() {
            return Err(ModuleError::ModuleUnloading);
        }

        Ok(ModuleRef {
            module_name: String::from(name),
        })
    }

    /// 로드 여부 확인
    pub fn is_loaded(name: &str) -> bool {
        LOADED_MODULES.read().iter().any(|m| m.name() == name)
    }

    /// 로드된 모듈 이름 목록
    pub fn list() -> Vec<String> {
        let modules = LOADED_MODULES.read();
        modules.iter().map(|m| String::from(m.name())).collect()
    }

    /// 모듈 상세 정보
    pub fn info(name: &str) -> Option<ModuleInfo> {
        let modules = LOADED_MODULES.read();
        modules.iter().find(|m| m.name() == name).map(|m| ModuleInfo {
            name: String::from(m.descriptor.name),
            version: String::from(m.descriptor.version),
            license: String::from(m.descriptor.license),
            state: m.state,
            ref_count: m.ref_count.load(Ordering::SeqCst),
            is_unloading: m.unloading.load(Ordering::SeqCst),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn nop_init() -> i32 {
        0
    }

    extern "C" fn nop_exit() {}

    extern "C" fn failing_init() -> i32 {
        -22
    }

    static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);
    static EXIT_CALLS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn counting_init() -> i32 {
        INIT_CALLS.fetch_add(1, Ordering::SeqCst);
        0
    }

    extern "C" fn counting_exit() {
        EXIT_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    const fn test_descriptor(
        name: &'static str,
        init: extern "C" fn() -> i32,
        exit: extern "C" fn(),
    ) -> ModuleDescriptor {
        ModuleDescriptor {
            name,
            version: "0.0.0",
            license: "GPL",
            author: "tests",
            description: "registry test module",
            init,
            exit,
        }
    }

    #[test]
    fn register_rejects_duplicate_names() {
        static FIRST: ModuleDescriptor = test_descriptor("dup_mod", nop_init, nop_exit);
        static SECOND: ModuleDescriptor = test_descriptor("dup_mod", nop_init, nop_exit);

        ModuleRegistry::register(&FIRST).unwrap();
        assert_eq!(
            ModuleRegistry::register(&SECOND),
            Err(ModuleError::AlreadyRegistered)
        );
    }

    #[test]
    fn load_unknown_name_fails() {
        assert_eq!(
            ModuleRegistry::load("no_such_module"),
            Err(ModuleError::NotFound)
        );
        assert_eq!(
            ModuleRegistry::unload("no_such_module"),
            Err(ModuleError::NotFound)
        );
    }

    #[test]
    fn lifecycle_invokes_hooks_once_per_cycle() {
        static DESC: ModuleDescriptor = test_descriptor("cycle_mod", counting_init, counting_exit);

        let init_before = INIT_CALLS.load(Ordering::SeqCst);
        let exit_before = EXIT_CALLS.load(Ordering::SeqCst);

        ModuleRegistry::register(&DESC).unwrap();
        ModuleRegistry::load("cycle_mod").unwrap();
        assert!(ModuleRegistry::is_loaded("cycle_mod"));
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), init_before + 1);
        assert_eq!(EXIT_CALLS.load(Ordering::SeqCst), exit_before);

        // 로드된 상태에서 재로드는 거부된다
        assert_eq!(
            ModuleRegistry::load("cycle_mod"),
            Err(ModuleError::AlreadyLoaded)
        );
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), init_before + 1);

        ModuleRegistry::unload("cycle_mod").unwrap();
        assert!(!ModuleRegistry::is_loaded("cycle_mod"));
        assert_eq!(EXIT_CALLS.load(Ordering::SeqCst), exit_before + 1);

        // unload 후에는 다시 로드할 수 있다
        ModuleRegistry::load("cycle_mod").unwrap();
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), init_before + 2);
        ModuleRegistry::unload("cycle_mod").unwrap();
    }

    #[test]
    fn failing_init_leaves_module_unloaded() {
        static DESC: ModuleDescriptor = test_descriptor("fail_mod", failing_init, nop_exit);

        ModuleRegistry::register(&DESC).unwrap();
        assert_eq!(
            ModuleRegistry::load("fail_mod"),
            Err(ModuleError::InitFailed(-22))
        );
        assert!(!ModuleRegistry::is_loaded("fail_mod"));
        assert_eq!(
            ModuleRegistry::unload("fail_mod"),
            Err(ModuleError::NotFound)
        );
    }

    #[test]
    fn live_reference_blocks_unload() {
        static DESC: ModuleDescriptor = test_descriptor("ref_mod", nop_init, nop_exit);

        ModuleRegistry::register(&DESC).unwrap();
        ModuleRegistry::load("ref_mod").unwrap();

        let guard = ModuleRegistry::acquire("ref_mod").unwrap();
        assert_eq!(guard.name(), "ref_mod");
        assert_eq!(ModuleRegistry::unload("ref_mod"), Err(ModuleError::InUse));

        drop(guard);
        ModuleRegistry::unload("ref_mod").unwrap();

        assert!(matches!(
            ModuleRegistry::acquire("ref_mod"),
            Err(ModuleError::NotFound)
        ));
    }

    #[test]
    fn info_reflects_descriptor_metadata() {
        static DESC: ModuleDescriptor = ModuleDescriptor {
            name: "info_mod",
            version: "1.2.3",
            license: "GPL",
            author: "tests",
            description: "registry test module",
            init: nop_init,
            exit: nop_exit,
        };

        ModuleRegistry::register(&DESC).unwrap();
        assert!(ModuleRegistry::info("info_mod").is_none());

        ModuleRegistry::load("info_mod").unwrap();
        let info = ModuleRegistry::info("info_mod").unwrap();
        assert_eq!(info.name, "info_mod");
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.license, "GPL");
        assert_eq!(info.state, ModuleState::Live);
        assert_eq!(info.ref_count, 0);
        assert!(!info.is_unloading);

        assert!(ModuleRegistry::list().contains(&String::from("info_mod")));
        ModuleRegistry::unload("info_mod").unwrap();
    }
}
