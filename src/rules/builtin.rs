//! Built-in rule sets for known retailers and the generic fallback

/// (domain pattern, product rules, pagination rules, exclusion rules)
pub(super) type RuleSource = (
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

/// Account, cart and static-asset links that no retailer wants crawled
const COMMON_EXCLUSIONS: &str = r"(?i)^/(?:cart|basket|checkout|login|log-in|logon|signin|sign-in|register|account|my-account|wishlist|help|privacy|terms|customer-service)(?:[/.?]|$)";
const STATIC_ASSETS: &str =
    r"(?i)\.(?:jpe?g|png|gif|svg|webp|ico|css|js|pdf|zip|mp4|woff2?)(?:\?|$)";

pub(super) const RETAILERS: &[RuleSource] = &[
    (
        "*.amazon.com",
        &[r"/dp/[A-Z0-9]{10}", r"/gp/product/[A-Z0-9]{10}"],
        &[r"^/s\?", r"^/b[/?]", r"[?&]page=\d+", r"[?&]node=\d+"],
        &[
            r"^/(?:gp/cart|ap/|gp/help|hz/wishlist|gp/your-account)",
            r"/(?:product|customer)-reviews/",
            STATIC_ASSETS,
        ],
    ),
    (
        "*.amazon.in",
        &[r"/dp/[A-Z0-9]{10}", r"/gp/product/[A-Z0-9]{10}"],
        &[r"^/s\?", r"^/b[/?]", r"[?&]page=\d+", r"[?&]node=\d+"],
        &[
            r"^/(?:gp/cart|ap/|gp/help|hz/wishlist|gp/your-account)",
            r"/(?:product|customer)-reviews/",
            STATIC_ASSETS,
        ],
    ),
    (
        "*.ebay.com",
        &[r"^/itm/"],
        &[r"^/b/", r"^/sch/", r"[?&]_pgn=\d+"],
        &[r"^/(?:signin|usr|myb|help)(?:[/?]|$)", STATIC_ASSETS],
    ),
    (
        "*.etsy.com",
        &[r"^/(?:[a-z]{2}(?:-[a-z]{2})?/)?listing/\d+"],
        &[r"^/(?:[a-z]{2}(?:-[a-z]{2})?/)?(?:c|search|market)/", r"[?&]page=\d+"],
        &[COMMON_EXCLUSIONS, r"^/your/", STATIC_ASSETS],
    ),
    (
        "*.target.com",
        &[r"^/p/[^?]*/-/A-\d+"],
        &[r"^/c/", r"^/s\?", r"[?&]Nao=\d+"],
        &[COMMON_EXCLUSIONS, r"^/co-", STATIC_ASSETS],
    ),
    (
        "*.argos.co.uk",
        &[r"^/product/\d+"],
        &[r"^/browse/", r"^/list/", r"/opt/page:\d+"],
        &[COMMON_EXCLUSIONS, STATIC_ASSETS],
    ),
    (
        "*.lowes.com",
        &[r"^/pd/"],
        &[r"^/pl/", r"^/c/", r"[?&]offset=\d+"],
        &[COMMON_EXCLUSIONS, STATIC_ASSETS],
    ),
    (
        "*.hm.com",
        &[r"productpage\.\d+\.html"],
        &[
            r"^/[a-z]{2}_[a-z]{2}/(?:ladies|men|kids|baby|home|divided|sale|beauty)(?:/[\w-]+)*\.html",
            r"[?&]page=\d+",
        ],
        &[COMMON_EXCLUSIONS, r"/(?:cart|login|account)\b", STATIC_ASSETS],
    ),
    (
        "*.samsclub.com",
        &[r"^/p/[^/?]+/[\w-]*\d+", r"^/ip/"],
        &[r"^/c/", r"^/b/", r"^/s/", r"[?&]offset=\d+"],
        &[COMMON_EXCLUSIONS, STATIC_ASSETS],
    ),
    (
        "*.albertsons.com",
        &[r"product-details\.\d+\.html"],
        &[r"^/shop/aisles/", r"^/shop/search-results", r"[?&]page=\d+"],
        &[COMMON_EXCLUSIONS, STATIC_ASSETS],
    ),
    (
        "*.zara.com",
        &[r"-p\d{8}\.html"],
        &[r"-l\d+\.html"],
        &[r"/(?:shop/cart|logon|help|login)(?:[/?.]|$)", STATIC_ASSETS],
    ),
];

/// Heuristics for sites without a dedicated rule set
pub(super) const GENERIC: RuleSource = (
    "*",
    &[
        r"(?i)/products?/",
        r"(?i)/item/",
        r"(?i)/p/",
        r"(?i)/shop/",
        // SKU-shaped numbers in the path
        r"^[^?]*\d{4,8}",
    ],
    &[
        r"(?i)[?&](?:page|pg|pagenum|start|offset)=\d+",
        r"(?i)/page/\d+",
        r"(?i)/(?:category|categories|collections?|departments?|browse|catalog|c|search)(?:[/?]|$)",
    ],
    &[COMMON_EXCLUSIONS, STATIC_ASSETS],
);
