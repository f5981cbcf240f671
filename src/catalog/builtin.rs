//! Built-in tags
//!
//! Stock tags for installer provenance, cross-platform frameworks, package
//! traits and push SDKs, with the requisites that load the data they need.
//! Tags sharing a load declare requisites with the same id, so the engine
//! runs each load once per app.

use async_trait::async_trait;
use std::sync::Arc;

use super::{FnRequisite, Labels, Requisite, TagCatalog, TagDefinition, TagIcon};
use crate::app::{AppType, ArchiveEntryFlags, DexPackageFlags};
use crate::config::Platform;
use crate::error::TagResult;
use crate::resolver::Resources;

pub const PLAY_STORE: &str = "com.android.vending";

/// Tag ids
pub mod ids {
    pub const INSTALLER_PLAY: &str = "installer.play";
    pub const INSTALLER: &str = "installer";
    pub const TECH_KOTLIN: &str = "tech.kotlin";
    pub const TECH_COMPOSE: &str = "tech.compose";
    pub const TECH_COMPOSE_MULTIPLATFORM: &str = "tech.compose_multiplatform";
    pub const TECH_FLUTTER: &str = "tech.flutter";
    pub const TECH_REACT_NATIVE: &str = "tech.react_native";
    pub const TECH_XAMARIN: &str = "tech.xamarin";
    pub const TECH_MAUI: &str = "tech.maui";
    pub const TECH_CORDOVA: &str = "tech.cordova";
    pub const ADAPTIVE_ICON: &str = "app.adaptive_icon";
    pub const SPLITS: &str = "pkg.splits";
    pub const SYSTEM: &str = "app.system";
    pub const SYSTEM_CORE: &str = "app.system_core";
    pub const SYSTEM_MODULE: &str = "app.system_module";
    pub const CATEGORY: &str = "app.category";
    pub const TYPE_OVERLAY: &str = "type.overlay";
    pub const TYPE_INSTANT: &str = "type.instant";
    pub const TYPE_WEB_APK: &str = "type.web_apk";
    pub const HIDDEN: &str = "app.hidden";
    pub const PREDICTIVE_BACK: &str = "app.predictive_back";
    pub const FULL_64BIT: &str = "pkg.64bit";
    pub const ABI_ARM: &str = "pkg.abi.arm";
    pub const ABI_X86: &str = "pkg.abi.x86";
    pub const PUSH_FCM: &str = "push.fcm";
    pub const PUSH_HUAWEI: &str = "push.huawei";
    pub const PUSH_XIAOMI: &str = "push.xiaomi";
    pub const PUSH_MEIZU: &str = "push.meizu";
    pub const PUSH_OPPO: &str = "push.oppo";
    pub const PUSH_VIVO: &str = "push.vivo";
    pub const PUSH_JPUSH: &str = "push.jpush";
    pub const PUSH_UPUSH: &str = "push.upush";
    pub const PUSH_TPNS: &str = "push.tpns";
    pub const PUSH_ALI: &str = "push.ali";
    pub const PUSH_BAIDU: &str = "push.baidu";
    pub const PUSH_GETUI: &str = "push.getui";
}

/// Requisite ids
pub mod requisites {
    pub const ARCHIVE_ENTRIES: &str = "archive-entries";
    pub const KOTLIN: &str = "kotlin";
    pub const MAUI: &str = "maui";
    pub const APP_ICON: &str = "app-icon";
    pub const PKG_SERVICES: &str = "pkg-services";
    pub const MIPUSH_SDK: &str = "mipush-sdk";
    pub const THIRD_PARTY_PKG: &str = "third-party-pkg";
    pub const PKG_INSTALLER: &str = "pkg-installer";
}

/// API levels gating platform-specific tags
mod sdk {
    pub const O: u32 = 26;
    pub const Q: u32 = 29;
    pub const T: u32 = 33;
}

const MIPUSH_SERVICE: &str = "com.xiaomi.mipush.sdk.MessageHandleService";

/// Build the stock catalog. Use [`TagCatalog::available_on`] to drop the
/// tags the host platform cannot report.
pub fn builtin_catalog() -> TagResult<TagCatalog> {
    TagCatalog::new(builtin_tags())
}

fn builtin_tags() -> Vec<TagDefinition> {
    let mut tags = vec![
        TagDefinition::new(ids::INSTALLER_PLAY, |res: &Resources| {
            res.app().installer().as_deref() == Some(PLAY_STORE)
        })
        .with_labels(Labels::pair("Google Play", "Installed by Google Play"))
        .with_icon(TagIcon::Package(PLAY_STORE.to_string()))
        .with_rank(100)
        .with_description(installer_desc)
        .with_requisite(installer_requisite()),
        TagDefinition::new(ids::INSTALLER, |res: &Resources| {
            res.app().installer().is_some_and(|installer| installer != PLAY_STORE)
        })
        .with_labels(Labels::dynamic("Package Installer"))
        .with_icon(TagIcon::Dynamic)
        .with_rank(110)
        .with_description(installer_desc)
        .with_requisite(installer_requisite()),
        TagDefinition::new(ids::TECH_KOTLIN, |res: &Resources| {
            let kotlin_dex =
                DexPackageFlags::KOTLIN | DexPackageFlags::JETPACK_COMPOSE | DexPackageFlags::COMPOSE_MULTIPLATFORM;
            archive_has(res, ArchiveEntryFlags::KOTLIN) || dex_has(res, kotlin_dex)
        })
        .with_label("Kotlin")
        .with_icon(TagIcon::Resource("ic_kotlin".into()))
        .with_rank(120)
        .with_description(package_desc("kotlin"))
        .with_requisite(kotlin_requisite()),
        TagDefinition::new(ids::TECH_COMPOSE, |res: &Resources| dex_has(res, DexPackageFlags::JETPACK_COMPOSE))
            .with_label("Jetpack Compose")
            .with_icon(TagIcon::Resource("ic_compose".into()))
            .with_rank(130)
            .with_description(package_desc("androidx.compose"))
            .with_requisite(third_party_pkg_requisite()),
        TagDefinition::new(ids::TECH_COMPOSE_MULTIPLATFORM, |res: &Resources| {
            dex_has(res, DexPackageFlags::COMPOSE_MULTIPLATFORM)
        })
        .with_label("Compose Multiplatform")
        .with_icon(TagIcon::Resource("ic_compose_cmp".into()))
        .with_rank(135)
        .with_description(package_desc("org.jetbrains.compose"))
        .with_requisite(third_party_pkg_requisite()),
        TagDefinition::new(ids::TECH_FLUTTER, |res: &Resources| archive_has(res, ArchiveEntryFlags::LIB_FLUTTER))
            .with_label("Flutter")
            .with_icon(TagIcon::Resource("ic_flutter".into()))
            .with_rank(140)
            .with_description(file_desc("libflutter.so"))
            .with_requisite(archive_entries_requisite()),
        TagDefinition::new(ids::TECH_REACT_NATIVE, |res: &Resources| {
            archive_has(res, ArchiveEntryFlags::LIB_REACT_NATIVE)
        })
        .with_label("React Native")
        .with_icon(TagIcon::Resource("ic_react".into()))
        .with_rank(150)
        .with_description(file_desc("libreactnative.so"))
        .with_requisite(archive_entries_requisite()),
        TagDefinition::new(ids::TECH_XAMARIN, |res: &Resources| archive_has(res, ArchiveEntryFlags::LIB_XAMARIN))
            .with_label("Xamarin")
            .with_icon(TagIcon::Resource("ic_xamarin".into()))
            .with_rank(160)
            .with_description(file_desc("libxamarin-app.so"))
            .with_requisite(archive_entries_requisite()),
        TagDefinition::new(ids::TECH_MAUI, |res: &Resources| {
            archive_has(res, ArchiveEntryFlags::LIB_MAUI) || dex_has(res, DexPackageFlags::MAUI)
        })
        .with_label(".NET MAUI")
        .with_icon(TagIcon::Resource("ic_dot_net".into()))
        .with_rank(165)
        .with_description(file_desc("libaot-Microsoft.Maui.dll.so"))
        .with_requisite(maui_requisite()),
        TagDefinition::new(ids::TECH_CORDOVA, |res: &Resources| dex_has(res, DexPackageFlags::CORDOVA))
            .with_label("Cordova")
            .with_icon(TagIcon::Resource("ic_cordova".into()))
            .with_rank(166)
            .with_description(package_desc("org.apache.cordova"))
            .with_requisite(third_party_pkg_requisite()),
        TagDefinition::new(ids::ADAPTIVE_ICON, |res: &Resources| res.inspection().adaptive_icon == Some(true))
            .with_label("Adaptive Icon")
            .with_icon(TagIcon::Resource("ic_ai".into()))
            .with_rank(170)
            .with_description(result_desc("The launcher icon is an adaptive icon"))
            .with_requisite(app_icon_requisite()),
        TagDefinition::new(ids::SPLITS, |res: &Resources| res.app().has_splits)
            .with_label("Split APKs")
            .with_icon(TagIcon::Resource("ic_aab".into()))
            .with_rank(180)
            .with_description(result_desc("Installed from a base APK plus split APKs")),
        TagDefinition::new(ids::SYSTEM, |res: &Resources| res.app().is_system)
            .with_labels(Labels::pair("System", "System apps"))
            .with_icon(TagIcon::Resource("ic_system".into()))
            .with_rank(190)
            .with_description(result_desc("Installed on the system partition")),
        TagDefinition::new(ids::SYSTEM_CORE, |res: &Resources| res.app().is_core_app)
            .with_labels(Labels::pair("Core", "Core app"))
            .with_icon(TagIcon::Text("CORE".into()))
            .with_rank(200)
            .with_description(result_desc("Declared as a core app, started before the device is unlocked")),
        TagDefinition::new(ids::SYSTEM_MODULE, |res: &Resources| res.app().is_module)
            .with_labels(Labels::pair("Module", "System module"))
            .with_icon(TagIcon::Text("MOD".into()))
            .with_rank(210)
            .with_availability(|platform: &Platform| platform.sdk_level >= sdk::Q)
            .with_description(result_desc("Delivered as an updatable system module")),
        TagDefinition::new(ids::CATEGORY, |res: &Resources| res.app().category.is_some())
            .with_label("Category")
            .with_icon(TagIcon::Text("CAT".into()))
            .with_rank(211)
            .with_value(|res: &Resources| res.app().category.map(|category| category.title().to_string()))
            .with_description(result_desc("Declares an app category in its manifest")),
        TagDefinition::new(ids::TYPE_OVERLAY, |res: &Resources| res.app().app_type == AppType::Overlay)
            .with_labels(Labels::pair("Overlay", "Runtime resource overlay"))
            .with_icon(TagIcon::Text("RRO".into()))
            .with_rank(220)
            .with_description(result_desc("Overlays the resources of another package")),
        TagDefinition::new(ids::TYPE_INSTANT, |res: &Resources| res.app().app_type == AppType::InstantApp)
            .with_labels(Labels::pair("Instant", "Instant app"))
            .with_icon(TagIcon::Text("INS".into()))
            .with_rank(230)
            .with_availability(|platform: &Platform| platform.sdk_level >= sdk::O)
            .with_description(result_desc("Runs without installation")),
        TagDefinition::new(ids::TYPE_WEB_APK, |res: &Resources| res.app().app_type == AppType::WebApk)
            .with_label("WebAPK")
            .with_icon(TagIcon::Resource("ic_pwa".into()))
            .with_rank(240)
            .with_description(result_desc("Progressive web app minted as a WebAPK")),
        TagDefinition::new(ids::HIDDEN, |res: &Resources| {
            !res.app().is_archive() && !res.app().is_launchable
        })
        .with_labels(Labels::pair("Hidden", "Apps without launcher entry"))
        .with_icon(TagIcon::Resource("ic_hidden".into()))
        .with_rank(250)
        .with_description(result_desc("Has no launcher entry")),
        TagDefinition::new(ids::PREDICTIVE_BACK, |res: &Resources| res.app().back_callback == Some(true))
            .with_labels(Labels::pair("Back", "Predictive back"))
            .with_icon(TagIcon::Text("BACK".into()))
            .with_rank(260)
            .with_availability(|platform: &Platform| platform.sdk_level >= sdk::T)
            .with_description(result_desc("Opts in to the predictive back gesture")),
        TagDefinition::new(ids::FULL_64BIT, |res: &Resources| {
            archive_has(res, ArchiveEntryFlags::NATIVE_LIBS_64B)
        })
        .with_labels(Labels::pair("64-bit", "Full 64-bit"))
        .with_icon(TagIcon::Text("64".into()))
        .with_rank(270)
        .with_availability(|platform: &Platform| platform.supports_64bit)
        .with_description(result_desc("Every native library has a 64-bit build"))
        .with_requisite(archive_entries_requisite()),
        TagDefinition::new(ids::ABI_ARM, |res: &Resources| {
            archive_has(res, ArchiveEntryFlags::LIB_ARM32) || archive_has(res, ArchiveEntryFlags::LIB_ARM64)
        })
        .with_labels(Labels::pair("ARM", "ARM native libraries"))
        .with_icon(TagIcon::Text("ARM".into()))
        .with_rank(280)
        .with_description(result_desc("Archive contains ARM native libraries"))
        .with_requisite(archive_entries_requisite()),
        TagDefinition::new(ids::ABI_X86, |res: &Resources| {
            archive_has(res, ArchiveEntryFlags::LIB_X86) || archive_has(res, ArchiveEntryFlags::LIB_X64)
        })
        .with_labels(Labels::pair("x86", "x86 native libraries"))
        .with_icon(TagIcon::Text("x86".into()))
        .with_rank(285)
        .with_description(result_desc("Archive contains x86 native libraries"))
        .with_requisite(archive_entries_requisite()),
    ];
    let push: [(&str, Labels, &str, u32, &'static [&'static str]); 12] = [
        (
            ids::PUSH_FCM,
            Labels::pair("FCM", "Firebase Cloud Messaging"),
            "ic_firebase",
            320,
            &["com.google.firebase.messaging.FirebaseMessagingService"],
        ),
        (
            ids::PUSH_HUAWEI,
            Labels::new("Huawei Push"),
            "ic_huawei",
            330,
            &["com.huawei.hms.support.api.push.service.HmsMsgService"],
        ),
        (
            ids::PUSH_XIAOMI,
            Labels::new("Xiaomi Push"),
            "ic_xiaomi",
            340,
            &[MIPUSH_SERVICE],
        ),
        (
            ids::PUSH_MEIZU,
            Labels::new("Meizu Push"),
            "ic_meizu",
            350,
            &["com.meizu.cloud.pushsdk.NotificationService"],
        ),
        (
            ids::PUSH_OPPO,
            Labels::new("OPPO Push"),
            "ic_oppo",
            360,
            &[
                "com.heytap.msp.push.service.DataMessageCallbackService",
                "com.heytap.mcssdk.AppPushService",
            ],
        ),
        (
            ids::PUSH_VIVO,
            Labels::new("vivo Push"),
            "ic_vivo",
            370,
            &["com.vivo.push.sdk.service.CommandClientService"],
        ),
        (
            ids::PUSH_JPUSH,
            Labels::pair("JPush", "Aurora JPush"),
            "ic_aurora",
            380,
            &["cn.jpush.android.service.PushService"],
        ),
        (
            ids::PUSH_UPUSH,
            Labels::pair("U-Push", "Umeng U-Push"),
            "ic_umeng",
            390,
            &["com.umeng.message.UmengIntentService"],
        ),
        (
            ids::PUSH_TPNS,
            Labels::pair("TPNS", "Tencent Push Notification Service"),
            "ic_tpns",
            400,
            &["com.tencent.android.tpush.service.XGVipPushService"],
        ),
        (
            ids::PUSH_ALI,
            Labels::pair("Ali Push", "Alibaba Cloud Mobile Push"),
            "ic_emas",
            410,
            &["org.android.agoo.accs.AgooService"],
        ),
        (
            ids::PUSH_BAIDU,
            Labels::new("Baidu Push"),
            "ic_baidu_push",
            420,
            &["com.baidu.android.pushservice.PushService"],
        ),
        (
            ids::PUSH_GETUI,
            Labels::new("Getui"),
            "ic_getui",
            430,
            &["com.igexin.sdk.PushService"],
        ),
    ];
    for (id, labels, icon, rank, services) in push {
        let tag = if id == ids::PUSH_XIAOMI {
            // the SDK's own checker, when it ran, overrides the declared service
            TagDefinition::new(id, |res: &Resources| {
                let checked = res.inspection().mipush_enabled;
                match checked {
                    Some(Some(enabled)) => enabled,
                    _ => declares_service(res, &[MIPUSH_SERVICE]),
                }
            })
            .with_description(|_: &Resources| {
                Some(format!("Declares service {}, checked by the MiPush SDK", MIPUSH_SERVICE))
            })
            .with_requisite(pkg_services_requisite())
            .with_requisite(mipush_requisite())
        } else {
            TagDefinition::new(id, move |res: &Resources| declares_service(res, services))
                .with_description(service_desc(services[0]))
                .with_requisite(pkg_services_requisite())
        };
        tags.push(
            tag.with_labels(labels)
                .with_icon(TagIcon::Resource(icon.to_string()))
                .with_rank(rank),
        );
    }
    tags
}

fn archive_has(res: &Resources, flag: ArchiveEntryFlags) -> bool {
    res.inspection().archive_entries.is_some_and(|flags| flags.contains(flag))
}

/// True when any of `flags` was found.
fn dex_has(res: &Resources, flags: DexPackageFlags) -> bool {
    res.inspection().dex_packages.is_some_and(|found| found.intersects(flags))
}

fn result_desc(text: &'static str) -> impl Fn(&Resources) -> Option<String> + Send + Sync + 'static {
    move |_| Some(text.to_string())
}

fn file_desc(file: &'static str) -> impl Fn(&Resources) -> Option<String> + Send + Sync + 'static {
    move |_| Some(format!("Archive contains {}", file))
}

fn package_desc(package: &'static str) -> impl Fn(&Resources) -> Option<String> + Send + Sync + 'static {
    move |_| Some(format!("DEX files contain package {}", package))
}

fn service_desc(class: &'static str) -> impl Fn(&Resources) -> Option<String> + Send + Sync + 'static {
    move |_| Some(format!("Declares service {}", class))
}

fn installer_desc(res: &Resources) -> Option<String> {
    res.app().installer().map(|installer| format!("Installed by {}", installer))
}

fn declares_service(res: &Resources, classes: &[&str]) -> bool {
    let inspection = res.inspection();
    let Some(declared) = inspection.service_classes.as_ref() else {
        return false;
    };
    classes.iter().any(|class| declared.contains(*class))
}

async fn retrieve_archive_entries(res: &Resources) -> anyhow::Result<()> {
    let entries = res.inspector().archive_entries(res.app()).await?;
    let flags = ArchiveEntryFlags::from_entries(&entries);
    tracing::debug!("{}: archive entry flags {:#x}", res.app().package_name, flags.bits());
    res.app().update_inspection(|p| p.archive_entries = Some(flags));
    Ok(())
}

async fn retrieve_dex_packages(res: &Resources) -> anyhow::Result<()> {
    let packages = res.inspector().dex_packages(res.app()).await?;
    let flags = DexPackageFlags::from_packages(&packages);
    tracing::debug!("{}: dex package flags {:#x}", res.app().package_name, flags.bits());
    res.app().update_inspection(|p| p.dex_packages = Some(flags));
    Ok(())
}

fn archive_entries_requisite() -> Arc<dyn Requisite> {
    FnRequisite::new(
        requisites::ARCHIVE_ENTRIES,
        |res| res.inspection().archive_entries.is_some(),
        |res| async move { retrieve_archive_entries(&res).await },
    )
    .into_arc()
}

fn third_party_pkg_requisite() -> Arc<dyn Requisite> {
    FnRequisite::new(
        requisites::THIRD_PARTY_PKG,
        |res| res.inspection().dex_packages.is_some(),
        |res| async move { retrieve_dex_packages(&res).await },
    )
    .into_arc()
}

/// Archive entries first; DEX packages only when the entries are inconclusive.
fn entries_then_dex(id: &'static str, flag: ArchiveEntryFlags) -> Arc<dyn Requisite> {
    FnRequisite::new(
        id,
        move |res| archive_has(res, flag) || res.inspection().dex_packages.is_some(),
        move |res| async move {
            let have_entries = res.inspection().archive_entries.is_some();
            if !have_entries {
                retrieve_archive_entries(&res).await?;
            }
            if !archive_has(&res, flag) {
                retrieve_dex_packages(&res).await?;
            }
            anyhow::Ok(())
        },
    )
    .into_arc()
}

fn kotlin_requisite() -> Arc<dyn Requisite> {
    entries_then_dex(requisites::KOTLIN, ArchiveEntryFlags::KOTLIN)
}

fn maui_requisite() -> Arc<dyn Requisite> {
    entries_then_dex(requisites::MAUI, ArchiveEntryFlags::LIB_MAUI)
}

fn app_icon_requisite() -> Arc<dyn Requisite> {
    FnRequisite::new(
        requisites::APP_ICON,
        |res| res.inspection().adaptive_icon.is_some(),
        |res| async move {
            let info = res.inspector().icon_info(res.app()).await?;
            res.app().update_inspection(|p| p.adaptive_icon = Some(info.adaptive));
            anyhow::Ok(())
        },
    )
    .into_arc()
}

fn pkg_services_requisite() -> Arc<dyn Requisite> {
    FnRequisite::new(
        requisites::PKG_SERVICES,
        |res| res.inspection().service_classes.is_some(),
        |res| async move {
            let classes = res.inspector().service_classes(res.app()).await?;
            res.app().update_inspection(|p| p.service_classes = Some(classes.into_iter().collect()));
            anyhow::Ok(())
        },
    )
    .into_arc()
}

fn mipush_requisite() -> Arc<dyn Requisite> {
    FnRequisite::new(
        requisites::MIPUSH_SDK,
        |res| res.inspection().mipush_enabled.is_some(),
        |res| async move {
            let enabled = res.inspector().mipush_enabled(res.app()).await?;
            tracing::debug!("{}: MiPush checker result {:?}", res.app().package_name, enabled);
            res.app().update_inspection(|p| p.mipush_enabled = Some(enabled));
            anyhow::Ok(())
        },
    )
    .into_arc()
}

fn installer_requisite() -> Arc<dyn Requisite> {
    Arc::new(InstallerRequisite)
}

/// Queries the installing store and publishes it as the dynamic label and
/// icon key of the requisite.
struct InstallerRequisite;

#[async_trait]
impl Requisite for InstallerRequisite {
    fn id(&self) -> &str {
        requisites::PKG_INSTALLER
    }

    fn check(&self, res: &Resources) -> bool {
        if res.app().is_archive() || res.inspection().installer == Some(None) {
            return true;
        }
        // the installer may be known from an earlier resolution, but the
        // dynamic values belong to this one
        res.dynamic_label(requisites::PKG_INSTALLER).is_some()
    }

    async fn load(&self, res: &Resources) -> anyhow::Result<()> {
        let known = res.inspection().installer.clone();
        let installer = match known {
            Some(installer) => installer,
            None => res.inspector().installer(res.app()).await?,
        };
        let Some(installer) = installer else {
            res.app().update_inspection(|p| p.installer = Some(None));
            return Ok(());
        };

        if let Err(e) = res.icons().ensure(&installer, res.inspector()).await {
            tracing::warn!("Failed to load icon of installer {}: {:#}", installer, e);
        }
        res.app().update_inspection(|p| p.installer = Some(Some(installer.clone())));
        res.set_dynamic_label(requisites::PKG_INSTALLER, installer.as_str());
        res.set_dynamic_icon_key(requisites::PKG_INSTALLER, installer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, InventoryInspector, PackageRecord};
    use crate::icons::IconCache;
    use crate::resolver::{group_requisites, LoadContext};

    fn resources(record: PackageRecord) -> Resources {
        let app = Arc::new(record.to_app());
        let context = LoadContext::new(Arc::new(InventoryInspector::new(vec![record])), Arc::new(IconCache::new()));
        Resources::new(app, Arc::new(context))
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let catalog = builtin_catalog().unwrap();
        assert!(catalog.get(ids::TECH_FLUTTER).is_some());
        assert!(catalog.tags().all(|t| t.labels.normal_label().is_some()));

        let groups = group_requisites(&catalog);
        let archive = groups.iter().find(|g| g.id() == requisites::ARCHIVE_ENTRIES).unwrap();
        assert!(archive.tag_ids.contains(&ids::TECH_FLUTTER.to_string()));
        assert!(archive.tag_ids.contains(&ids::FULL_64BIT.to_string()));
        let services = groups.iter().find(|g| g.id() == requisites::PKG_SERVICES).unwrap();
        assert_eq!(services.tag_ids.len(), 12);
    }

    #[tokio::test]
    async fn test_kotlin_from_archive_skips_dex() {
        let res = resources(PackageRecord {
            package_name: "com.example".into(),
            archive_entries: vec!["kotlin/kotlin.kotlin_builtins".into()],
            dex_packages: vec!["androidx.compose.ui".into()],
            ..Default::default()
        });
        let requisite = kotlin_requisite();
        assert!(!requisite.check(&res));
        requisite.load(&res).await.unwrap();
        assert!(requisite.check(&res));
        assert!(res.inspection().dex_packages.is_none());
    }

    #[tokio::test]
    async fn test_installer_sets_dynamic_values() {
        let res = resources(PackageRecord {
            package_name: "com.example".into(),
            installer: Some("org.fdroid.fdroid".into()),
            ..Default::default()
        });
        let requisite = installer_requisite();
        assert!(!requisite.check(&res));
        requisite.load(&res).await.unwrap();
        assert!(requisite.check(&res));
        assert_eq!(res.dynamic_icon_key(requisites::PKG_INSTALLER).as_deref(), Some("org.fdroid.fdroid"));
        assert_eq!(res.app().installer().as_deref(), Some("org.fdroid.fdroid"));
    }

    #[tokio::test]
    async fn test_missing_installer_is_recorded() {
        let res = resources(PackageRecord { package_name: "com.example".into(), ..Default::default() });
        let requisite = installer_requisite();
        requisite.load(&res).await.unwrap();
        assert!(requisite.check(&res));
        assert_eq!(res.inspection().installer, Some(None));
    }

    #[test]
    fn test_platform_gates() {
        let old_32bit = Platform { sdk_level: 28, supports_64bit: false };
        let catalog = builtin_catalog().unwrap().available_on(&old_32bit);
        for gated in [ids::SYSTEM_MODULE, ids::PREDICTIVE_BACK, ids::FULL_64BIT] {
            assert!(catalog.get(gated).is_none(), "{}", gated);
        }
        assert!(catalog.get(ids::TYPE_INSTANT).is_some());

        let full = builtin_catalog().unwrap();
        let count = full.len();
        assert_eq!(full.available_on(&Platform::default()).len(), count);
    }

    #[test]
    fn test_category_value_and_app_types() {
        let catalog = builtin_catalog().unwrap();
        let res = resources(PackageRecord {
            package_name: "com.example.maps".into(),
            category: Some(crate::app::AppCategory::Maps),
            app_type: AppType::WebApk,
            ..Default::default()
        });
        let category = catalog.get(ids::CATEGORY).unwrap();
        assert!(category.express(&res));
        assert_eq!(category.value(&res).as_deref(), Some("Maps & Navigation"));
        assert!(catalog.get(ids::TYPE_WEB_APK).unwrap().express(&res));
        assert!(!catalog.get(ids::TYPE_OVERLAY).unwrap().express(&res));
        assert_eq!(catalog.get(ids::SYSTEM).unwrap().value(&res), None);
    }

    #[tokio::test]
    async fn test_mipush_checker_overrides_declared_service() {
        let catalog = builtin_catalog().unwrap();
        let xiaomi = catalog.get(ids::PUSH_XIAOMI).unwrap();
        let requisite_ids: Vec<&str> = xiaomi.requisites.iter().map(|r| r.id()).collect();
        assert_eq!(requisite_ids, vec![requisites::PKG_SERVICES, requisites::MIPUSH_SDK]);

        for (checker, expected) in [(Some(false), false), (Some(true), true), (None, true)] {
            let res = resources(PackageRecord {
                package_name: "com.example".into(),
                services: vec![MIPUSH_SERVICE.into()],
                mipush_enabled: checker,
                ..Default::default()
            });
            for requisite in &xiaomi.requisites {
                requisite.load(&res).await.unwrap();
                assert!(requisite.check(&res));
            }
            assert_eq!(xiaomi.express(&res), expected, "checker {:?}", checker);
        }
    }

    #[tokio::test]
    async fn test_descriptions() {
        let catalog = builtin_catalog().unwrap();
        let res = resources(PackageRecord {
            package_name: "com.example".into(),
            installer: Some(PLAY_STORE.into()),
            ..Default::default()
        });
        let play = catalog.get(ids::INSTALLER_PLAY).unwrap();
        assert_eq!(play.describe(&res), None);
        installer_requisite().load(&res).await.unwrap();
        assert_eq!(play.describe(&res).as_deref(), Some("Installed by com.android.vending"));

        let fcm = catalog.get(ids::PUSH_FCM).unwrap();
        assert_eq!(
            fcm.describe(&res).as_deref(),
            Some("Declares service com.google.firebase.messaging.FirebaseMessagingService")
        );
        assert!(catalog.tags().all(|t| t.describe(&res).is_some()));
    }

    #[test]
    fn test_archives_need_no_installer() {
        let app = Arc::new(App::new("com.example").with_archive("/tmp/example.apk"));
        let context = LoadContext::new(Arc::new(InventoryInspector::new(Vec::new())), Arc::new(IconCache::new()));
        let res = Resources::new(app, Arc::new(context));
        assert!(installer_requisite().check(&res));
    }
}
