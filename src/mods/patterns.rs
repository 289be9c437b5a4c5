/// Lowercase substrings identifying mods that are client-side only and
/// crash (or do nothing useful) on a dedicated server.
///
/// Matched against lowercased jar file names. The list is deliberately
/// conservative: rendering, shader, HUD, minimap, and input mods whose
/// server builds do not exist.
pub(crate) const CLIENT_ONLY_PATTERNS: &[&str] = &[
    // Renderers and performance clients
    "optifine",
    "optifabric",
    "sodium",
    "sodiumextra",
    "sodium-extra",
    "reeses-sodium-options",
    "reeses_sodium_options",
    "indium",
    "rubidium",
    "embeddium",
    "nvidium",
    "vulkanmod",
    "exordium",
    // Shaders
    "iris",
    "irisshaders",
    "oculus",
    "shaderpack",
    "shaders",
    "complementary",
    "bsl-shader",
    "sildurs",
    // Lighting and culling
    "lambdynamiclights",
    "ryoamiclights",
    "dynamiclights",
    "dynamic-lights",
    "entityculling",
    "entity_culling",
    "entity-culling",
    "cullleaves",
    "cull-leaves",
    "moreculling",
    "more-culling",
    // Minimaps and world maps
    "xaerominimap",
    "xaerosminimap",
    "xaeros_minimap",
    "xaeros-minimap",
    "xaeroworldmap",
    "xaerosworldmap",
    "xaeros_world_map",
    "voxelmap",
    "antiqueatlas",
    // HUD and interface
    "betterf3",
    "bettertaskbar",
    "beautifiedchat",
    "chat_heads",
    "chatheads",
    "smoothchunk",
    "smooth-chunk",
    "itemphysic",
    "itemzoom",
    "item-borders",
    "itemborders",
    "legendarytooltips",
    "equipmentcompare",
    "enchdesc",
    "torohealth",
    "overloadedarmorbar",
    "durabilitytooltip",
    "hwyla",
    "wthit",
    "jade-",
    "betterthirdperson",
    "better-third-person",
    "notenoughanimations",
    "not-enough-animations",
    "firstperson",
    "first-person",
    // Audio and ambience
    "soundphysics",
    "sound-physics",
    "presencefootsteps",
    "presence-footsteps",
    "ambientsounds",
    "extremesoundmuffler",
    "dripsounds",
    "auditory",
    // Input and controls
    "mousetweaks",
    "mouse-tweaks",
    "mousewheelie",
    "mouse-wheelie",
    "controlling",
    "keybindspurger",
    "cherishedworlds",
    "borderlessmining",
    "borderless-mining",
    "fullscreenwindowed",
    // Visual effects
    "fallingleaves",
    "falling-leaves",
    "visuality",
    "particlerain",
    "particle-rain",
    "effective",
    "illuminations",
    "skinlayers",
    "skin-layers",
    "3dskinlayers",
    "eatinganimation",
    "eating-animation",
    "wavey-capes",
    "waveycapes",
    "blur",
    "fancymenu",
    "drippyloadingscreen",
    "loadingbackgrounds",
    // Client utilities
    "modmenu",
    "mod-menu",
    "catalogue",
    "craftpresence",
    "discordrichpresence",
    "discordrpc",
    "replaymod",
    "screenshotviewer",
    "gamma",
    "fullbright",
    "zoomify",
    "wi-zoom",
    "logicalzoom",
    "okzoomer",
    "freecam",
];
